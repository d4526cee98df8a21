// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for session requests.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
	attempts: AtomicU64,
	cache_hits: AtomicU64,
	logins: AtomicU64,
	failures: AtomicU64,
	lock_timeouts: AtomicU64,
}
impl BrokerMetrics {
	/// Returns the total number of session requests.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of requests served without running a login themselves.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of provider logins started.
	pub fn logins(&self) -> u64 {
		self.logins.load(Ordering::Relaxed)
	}

	/// Returns the number of failed requests.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that failed on a lock or gate timeout.
	pub fn lock_timeouts(&self) -> u64 {
		self.lock_timeouts.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_login(&self) {
		self.logins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_lock_timeout(&self) {
		self.lock_timeouts.fetch_add(1, Ordering::Relaxed);
	}
}
