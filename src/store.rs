//! Locked session cache shared by every broker operation.
//!
//! [`SessionStore`] owns one mutex guarding two maps: cached sessions and the per-identity
//! refresh coordinators. Keeping both behind the same lock means a
//! coordinator is created exactly once per identity and its in-progress flag is always
//! toggled in the same critical section that other callers use to read it. Every operation
//! is a short in-memory map access; the lock is never held across I/O or `.await`.

mod coordinator;

pub(crate) use coordinator::{InProgressMark, RefreshState};

// self
use crate::{
	_prelude::*,
	auth::{Identity, Session},
};

/// Mapping from identity to its cached session plus the refresh coordinator table.
#[derive(Debug, Default)]
pub struct SessionStore(Mutex<StoreState>);
impl SessionStore {
	/// Returns the cached session for `identity`, if any, regardless of freshness.
	pub fn get(&self, identity: &str) -> Option<Arc<Session>> {
		self.0.lock().sessions.get(identity).cloned()
	}

	/// Caches `session` for `identity`, returning the session it replaced.
	pub fn put(
		&self,
		identity: Identity,
		session: impl Into<Arc<Session>>,
	) -> Option<Arc<Session>> {
		self.0.lock().sessions.insert(identity, session.into())
	}

	/// Drops the cached session for `identity` so the next request refreshes it.
	pub fn invalidate(&self, identity: &str) -> Option<Arc<Session>> {
		self.0.lock().sessions.remove(identity)
	}

	/// Drops every cached session, returning how many were removed.
	///
	/// Refresh coordinators survive so in-flight refreshes keep their single-flight guarantees.
	pub fn invalidate_all(&self) -> usize {
		let mut state = self.0.lock();
		let dropped = state.sessions.len();

		state.sessions.clear();

		dropped
	}

	/// Number of cached sessions.
	pub fn len(&self) -> usize {
		self.0.lock().sessions.len()
	}

	/// Returns `true` when no session is cached.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Identities that currently have a cached session, in no particular order.
	pub fn identities(&self) -> Vec<Identity> {
		self.0.lock().sessions.keys().cloned().collect()
	}

	/// Returns the refresh coordinator for `identity`, creating it on first use.
	pub(crate) fn coordinator(&self, identity: &Identity) -> Arc<RefreshState> {
		let mut state = self.0.lock();

		if let Some(existing) = state.coordinators.get(identity.as_str()) {
			return existing.clone();
		}

		let created = Arc::new(RefreshState::default());

		state.coordinators.insert(identity.clone(), created.clone());

		created
	}

	/// Runs `f` while holding the store lock.
	pub(crate) fn locked<R>(&self, f: impl FnOnce() -> R) -> R {
		let _state = self.0.lock();

		f()
	}

	#[cfg(test)]
	fn coordinator_count(&self) -> usize {
		self.0.lock().coordinators.len()
	}
}

#[derive(Debug, Default)]
struct StoreState {
	sessions: HashMap<Identity, Arc<Session>>,
	coordinators: HashMap<Identity, Arc<RefreshState>>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn identity(value: &str) -> Identity {
		Identity::new(value).expect("Identity fixture should be valid.")
	}

	fn session(value: &str) -> Arc<Session> {
		Arc::new(
			Session::builder()
				.cookie("sid", value)
				.issued_now()
				.expires_in(StdDuration::from_secs(600))
				.build()
				.expect("Session fixture should build."),
		)
	}

	#[test]
	fn put_replaces_and_returns_previous_session() {
		let store = SessionStore::default();
		let first = session("one");
		let second = session("two");

		assert!(store.put(identity("alice"), first.clone()).is_none());

		let replaced = store
			.put(identity("alice"), second.clone())
			.expect("Second put should return the displaced session.");

		assert!(Arc::ptr_eq(&replaced, &first));
		assert!(Arc::ptr_eq(
			&store.get("alice").expect("Replacement should be cached."),
			&second
		));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn invalidate_targets_one_identity() {
		let store = SessionStore::default();

		store.put(identity("alice"), session("a"));
		store.put(identity("bob"), session("b"));

		assert!(store.invalidate("alice").is_some());
		assert!(store.invalidate("alice").is_none());
		assert!(store.get("alice").is_none());
		assert!(store.get("bob").is_some());
		assert_eq!(store.identities(), vec![identity("bob")]);
	}

	#[test]
	fn invalidate_all_keeps_coordinators() {
		let store = SessionStore::default();
		let alice = identity("alice");

		store.put(alice.clone(), session("a"));
		store.put(identity("bob"), session("b"));

		let coordinator = store.coordinator(&alice);

		assert_eq!(store.invalidate_all(), 2);
		assert!(store.is_empty());
		assert!(Arc::ptr_eq(&coordinator, &store.coordinator(&alice)));
	}

	#[test]
	fn coordinator_is_created_once_under_contention() {
		let store = Arc::new(SessionStore::default());
		let alice = identity("alice");
		let handles = (0..8)
			.map(|_| {
				let store = store.clone();
				let alice = alice.clone();

				std::thread::spawn(move || store.coordinator(&alice))
			})
			.collect::<Vec<_>>();
		let coordinators = handles
			.into_iter()
			.map(|handle| handle.join().expect("Coordinator thread should not panic."))
			.collect::<Vec<_>>();

		assert_eq!(store.coordinator_count(), 1);
		assert!(coordinators.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
	}
}
