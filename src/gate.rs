//! Process-wide login gate serializing access to the scarce external login resource.
//!
//! Only one login (and therefore at most one pending out-of-band approval prompt) may be in
//! flight across all identities. The gate is acquired with its own, usually longer, timeout
//! because the holder may be waiting on a human for minutes.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::_prelude::*;

/// Single mutex with no data, shared by every refresh that needs to run a login.
#[derive(Debug, Default)]
pub struct LoginGate {
	lock: Arc<AsyncMutex<()>>,
	held: Arc<AtomicBool>,
}
impl LoginGate {
	/// Acquires the gate, returning `None` if `timeout` elapsed first.
	///
	/// A zero timeout still succeeds when the gate is free.
	pub async fn acquire(&self, timeout: StdDuration) -> Option<LoginGateGuard> {
		let guard = tokio::time::timeout(timeout, self.lock.lock_arc()).await.ok()?;

		self.held.store(true, Ordering::Release);

		Some(LoginGateGuard { _guard: guard, held: self.held.clone() })
	}

	/// Returns `true` while a login holds the gate.
	pub fn is_busy(&self) -> bool {
		self.held.load(Ordering::Acquire)
	}
}

/// RAII guard returned by [`LoginGate::acquire`]; dropping it reopens the gate.
pub struct LoginGateGuard {
	_guard: AsyncMutexGuard<()>,
	held: Arc<AtomicBool>,
}
impl Drop for LoginGateGuard {
	fn drop(&mut self) {
		// Cleared while the mutex is still held so it never overwrites the next holder's flag.
		self.held.store(false, Ordering::Release);
	}
}
impl Debug for LoginGateGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("LoginGateGuard(..)")
	}
}
