//! Test doubles shared by the broker integration suites.

#![allow(dead_code)]

// std
use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::{Notify, Semaphore};
// self
use session_broker::{
	auth::{Cookie, Identity, Session},
	broker::{Broker, SessionRequest},
	config::BrokerConfig,
	login::{LoginContext, LoginError, LoginFuture, LoginProvider},
	notify::{Notification, NotificationCategory, Notifier, NotifyError},
	validate::{SessionValidator, ValidationFuture},
};

pub fn identity(value: &str) -> Identity {
	Identity::new(value).expect("Identity fixture should be valid.")
}

pub fn request(value: &str) -> SessionRequest {
	SessionRequest::new(identity(value), "correct horse battery staple")
}

pub fn session(cookie: &str, issued_at: OffsetDateTime, expires_at: OffsetDateTime) -> Session {
	Session::builder()
		.cookie("sid", cookie)
		.issued_at(issued_at)
		.expires_at(expires_at)
		.build()
		.expect("Session fixture should build.")
}

/// A session issued a minute ago that stays valid for another half hour.
pub fn fresh_session(cookie: &str) -> Arc<Session> {
	let now = OffsetDateTime::now_utc();

	Arc::new(session(cookie, now - time::Duration::minutes(1), now + time::Duration::minutes(30)))
}

pub fn broker(login: Arc<StubLogin>, validator: Arc<StubValidator>) -> Broker {
	Broker::new(validator, login)
}

pub fn fast_config() -> BrokerConfig {
	BrokerConfig::default()
		.with_lock_timeout(StdDuration::from_secs(5))
		.with_in_progress_wait_timeout(StdDuration::from_secs(5))
		.with_gate_timeout(StdDuration::from_secs(5))
		.with_approval_ceiling(StdDuration::from_secs(5))
}

/// Scripted login provider that records call counts and concurrency.
#[derive(Debug, Default)]
pub struct StubLogin {
	calls: AtomicUsize,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
	per_identity: Mutex<HashMap<String, (usize, usize)>>,
	delay: StdDuration,
	fail: AtomicBool,
	empty: AtomicBool,
	no_approval: bool,
	progress: Option<&'static str>,
	release: Option<Arc<Semaphore>>,
	entered: Arc<Notify>,
}
impl StubLogin {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn with_delay(delay: StdDuration) -> Arc<Self> {
		Arc::new(Self { delay, ..Default::default() })
	}

	/// Every login blocks until a permit is added to the returned semaphore.
	pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
		let release = Arc::new(Semaphore::new(0));

		(Arc::new(Self { release: Some(release.clone()), ..Default::default() }), release)
	}

	/// Every login sends `message` through its context before returning.
	pub fn chatty(message: &'static str) -> Arc<Self> {
		Arc::new(Self { progress: Some(message), ..Default::default() })
	}

	pub fn without_approval() -> Arc<Self> {
		Arc::new(Self { no_approval: true, ..Default::default() })
	}

	pub fn fail(&self) {
		self.fail.store(true, Ordering::SeqCst);
	}

	pub fn recover(&self) {
		self.fail.store(false, Ordering::SeqCst);
	}

	pub fn return_nothing(&self) {
		self.empty.store(true, Ordering::SeqCst);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}

	pub fn max_in_flight_for(&self, identity: &str) -> usize {
		self.per_identity.lock().get(identity).map(|(_, max)| *max).unwrap_or_default()
	}

	/// Resolves once a login has started.
	pub async fn entered(&self) {
		self.entered.notified().await;
	}
}
impl LoginProvider for StubLogin {
	fn login<'a>(&'a self, context: LoginContext<'a>) -> LoginFuture<'a> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
			let _in_flight = InFlight::enter(self, context.identity.as_str());

			self.entered.notify_one();

			if let Some(message) = self.progress {
				context.notify(NotificationCategory::Info, message);
			}

			if let Some(release) = &self.release {
				release.acquire().await.expect("Release semaphore should stay open.").forget();
			}
			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}
			if self.fail.load(Ordering::SeqCst) {
				return Err(LoginError::Automation { message: "stub login failure".into() });
			}
			if self.empty.load(Ordering::SeqCst) {
				return Ok(Vec::new());
			}

			Ok(vec![Cookie::new("sid", format!("{}-{call}", context.identity))])
		})
	}

	fn requires_approval(&self) -> bool {
		!self.no_approval
	}
}

struct InFlight<'a> {
	login: &'a StubLogin,
	identity: String,
}
impl<'a> InFlight<'a> {
	fn enter(login: &'a StubLogin, identity: &str) -> Self {
		let now = login.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

		login.max_in_flight.fetch_max(now, Ordering::SeqCst);

		let mut per_identity = login.per_identity.lock();
		let entry = per_identity.entry(identity.to_owned()).or_default();

		entry.0 += 1;
		entry.1 = entry.1.max(entry.0);

		Self { login, identity: identity.to_owned() }
	}
}
impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.login.in_flight.fetch_sub(1, Ordering::SeqCst);

		if let Some(entry) = self.login.per_identity.lock().get_mut(&self.identity) {
			entry.0 -= 1;
		}
	}
}

/// Validator accepting every session except revoked cookie headers.
#[derive(Debug, Default)]
pub struct StubValidator {
	calls: AtomicUsize,
	delay: StdDuration,
	reject_all: AtomicBool,
	revoked: Mutex<HashSet<String>>,
}
impl StubValidator {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn with_delay(delay: StdDuration) -> Arc<Self> {
		Arc::new(Self { delay, ..Default::default() })
	}

	pub fn reject_all(&self) {
		self.reject_all.store(true, Ordering::SeqCst);
	}

	pub fn revoke(&self, session: &Session) {
		self.revoked.lock().insert(session.cookie_header());
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl SessionValidator for StubValidator {
	fn is_valid<'a>(&'a self, session: &'a Session, _: &'a Identity) -> ValidationFuture<'a> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}

			!self.reject_all.load(Ordering::SeqCst)
				&& !self.revoked.lock().contains(&session.cookie_header())
		})
	}
}

/// Notifier that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier(Mutex<Vec<Notification>>);
impl RecordingNotifier {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn notifications(&self) -> Vec<Notification> {
		self.0.lock().clone()
	}

	pub fn categories(&self) -> Vec<NotificationCategory> {
		self.0.lock().iter().map(|notification| notification.category).collect()
	}
}
impl Notifier for RecordingNotifier {
	fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
		self.0.lock().push(notification);

		Ok(())
	}
}

/// Notifier whose transport always fails.
#[derive(Debug, Default)]
pub struct FailingNotifier;
impl Notifier for FailingNotifier {
	fn notify(&self, _: Notification) -> Result<(), NotifyError> {
		Err(NotifyError::Delivery { message: "socket closed".into() })
	}
}

/// Notifier that panics on every message.
#[derive(Debug, Default)]
pub struct PanickingNotifier;
impl Notifier for PanickingNotifier {
	fn notify(&self, _: Notification) -> Result<(), NotifyError> {
		panic!("notifier exploded")
	}
}
