//! The session broker facade: one explicitly constructed object owning the session cache, the
//! per-identity coordinators, and the global login gate.

mod acquire;
mod metrics;
mod request;

pub use self::{metrics::BrokerMetrics, request::SessionRequest};

// self
use crate::{
	_prelude::*,
	auth::Session,
	config::BrokerConfig,
	gate::LoginGate,
	login::LoginProvider,
	notify::{NoopNotifier, Notifier},
	store::SessionStore,
	validate::SessionValidator,
};

/// Hands out validated portal sessions, logging in at most once per identity at a time and at
/// most once system-wide at a time.
///
/// The broker owns its cache, coordinator table, and gate, so independent instances never share
/// state. Clones are cheap and share everything; hand clones to request handlers and background
/// pollers rather than constructing one broker per caller. Session requests must run inside a
/// tokio runtime because the login step is driven by a spawned task.
#[derive(Clone)]
pub struct Broker {
	/// Timing configuration applied to every request.
	pub config: BrokerConfig,
	/// Shared counters for request outcomes.
	pub metrics: Arc<BrokerMetrics>,
	store: Arc<SessionStore>,
	gate: Arc<LoginGate>,
	validator: Arc<dyn SessionValidator>,
	login: Arc<dyn LoginProvider>,
	notifier: Arc<dyn Notifier>,
}
impl Broker {
	/// Creates a broker with default configuration and notifications disabled.
	pub fn new(validator: Arc<dyn SessionValidator>, login: Arc<dyn LoginProvider>) -> Self {
		Self {
			config: BrokerConfig::default(),
			metrics: Default::default(),
			store: Default::default(),
			gate: Default::default(),
			validator,
			login,
			notifier: Arc::new(NoopNotifier),
		}
	}

	/// Replaces the timing configuration.
	pub fn with_config(mut self, config: BrokerConfig) -> Self {
		self.config = config;

		self
	}

	/// Routes login lifecycle notifications to `notifier`.
	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;

		self
	}

	/// Session cache backing this broker.
	pub fn store(&self) -> &SessionStore {
		&self.store
	}

	/// Process-wide login gate used by this broker.
	pub fn login_gate(&self) -> &LoginGate {
		&self.gate
	}

	/// Returns `true` while any identity's login holds the gate.
	pub fn is_login_in_flight(&self) -> bool {
		self.gate.is_busy()
	}

	/// Forces the next request for `identity` to log in again.
	///
	/// Call this after a downstream request made with a supposedly valid session comes back
	/// unauthorized.
	pub fn invalidate(&self, identity: &str) -> Option<Arc<Session>> {
		let dropped = self.store.invalidate(identity);

		if dropped.is_some() {
			tracing::info!(identity, "Cached session invalidated.");
		}

		dropped
	}

	/// Drops every cached session, returning how many were removed.
	pub fn invalidate_all(&self) -> usize {
		let dropped = self.store.invalidate_all();

		tracing::info!(dropped, "All cached sessions invalidated.");

		dropped
	}
}
impl Debug for Broker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("config", &self.config)
			.field("cached_sessions", &self.store.len())
			.field("login_in_flight", &self.gate.is_busy())
			.finish()
	}
}
