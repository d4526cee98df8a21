//! Per-identity refresh coordination: one async mutex plus one in-progress flag per identity.
//!
//! The flag lives in a `watch` channel so callers that find a refresh already running can be
//! woken as soon as it finishes instead of polling. Reads and writes of the flag happen while
//! the owning [`SessionStore`] lock is held, which keeps them ordered with cache reads.

// crates.io
use tokio::sync::watch;
// self
use crate::{_prelude::*, store::SessionStore};

/// Single-flight state for one identity; created once and kept for the process lifetime.
#[derive(Debug)]
pub(crate) struct RefreshState {
	guard: Arc<AsyncMutex<()>>,
	in_progress: watch::Sender<bool>,
}
impl RefreshState {
	pub(crate) fn is_in_progress(&self, store: &SessionStore) -> bool {
		store.locked(|| *self.in_progress.borrow())
	}

	/// Sets the flag, returning `false` if it was already set.
	pub(crate) fn try_mark_in_progress(&self, store: &SessionStore) -> bool {
		store.locked(|| !self.in_progress.send_replace(true))
	}

	pub(crate) fn clear_in_progress(&self, store: &SessionStore) {
		store.locked(|| {
			self.in_progress.send_replace(false);
		});
	}

	/// Waits until no refresh is in progress; `false` when `timeout` elapsed first.
	pub(crate) async fn wait_until_idle(&self, timeout: StdDuration) -> bool {
		let mut idle = self.in_progress.subscribe();

		tokio::time::timeout(timeout, idle.wait_for(|busy| !*busy))
			.await
			.is_ok_and(|changed| changed.is_ok())
	}

	/// Acquires the identity mutex, giving up after `timeout`.
	pub(crate) async fn lock(&self, timeout: StdDuration) -> Option<AsyncMutexGuard<()>> {
		tokio::time::timeout(timeout, self.guard.lock_arc()).await.ok()
	}
}
impl Default for RefreshState {
	fn default() -> Self {
		let (in_progress, _) = watch::channel(false);

		Self { guard: Arc::new(AsyncMutex::new(())), in_progress }
	}
}

/// Holds the in-progress flag for one identity and clears it on drop.
#[derive(Debug)]
pub(crate) struct InProgressMark {
	state: Arc<RefreshState>,
	store: Arc<SessionStore>,
}
impl InProgressMark {
	pub(crate) fn set(state: Arc<RefreshState>, store: Arc<SessionStore>) -> Self {
		if !state.try_mark_in_progress(&store) {
			tracing::warn!("Refresh flag was already set while holding the identity mutex.");
		}

		Self { state, store }
	}
}
impl Drop for InProgressMark {
	fn drop(&mut self) {
		self.state.clear_in_progress(&self.store);
	}
}
