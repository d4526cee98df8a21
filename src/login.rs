//! Login provider contract: the expensive, possibly human-gated step that mints new sessions.
//!
//! The broker never knows how a login is performed (browser automation, a headless form post,
//! a test stub). It only serializes calls behind the login gate, bounds them with the approval
//! ceiling, and validates what comes back.

// self
use crate::{
	_prelude::*,
	auth::{Cookie, Identity, Secret},
	notify::{self, Notification, NotificationCategory, Notifier},
};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by [`LoginProvider::login`].
pub type LoginFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Vec<Cookie>, LoginError>> + 'a + Send>>;

/// Performs a portal login for one identity.
pub trait LoginProvider
where
	Self: Send + Sync,
{
	/// Logs in and returns the issued credential pairs in portal order.
	///
	/// Implementations may block for as long as the out-of-band approval takes; the broker
	/// cancels the future once [`LoginContext::approval_ceiling`] elapses.
	fn login<'a>(&'a self, context: LoginContext<'a>) -> LoginFuture<'a>;

	/// Whether the broker should announce an approval prompt before calling [`Self::login`].
	fn requires_approval(&self) -> bool {
		true
	}
}

/// Inputs handed to a [`LoginProvider`] for one login attempt.
#[derive(Clone, Copy)]
pub struct LoginContext<'a> {
	/// Identity being logged in.
	pub identity: &'a Identity,
	/// Secret supplied by the caller.
	pub secret: &'a Secret,
	/// Upper bound the broker enforces on the whole attempt.
	pub approval_ceiling: StdDuration,
	notifier: &'a dyn Notifier,
}
impl<'a> LoginContext<'a> {
	pub(crate) fn new(
		identity: &'a Identity,
		secret: &'a Secret,
		approval_ceiling: StdDuration,
		notifier: &'a dyn Notifier,
	) -> Self {
		Self { identity, secret, approval_ceiling, notifier }
	}

	/// Sends an extra progress message for this identity; delivery failures are ignored.
	pub fn notify(&self, category: NotificationCategory, message: impl Into<String>) {
		notify::deliver(self.notifier, Notification::new(self.identity.clone(), category, message));
	}
}
impl Debug for LoginContext<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginContext")
			.field("identity", self.identity)
			.field("secret", self.secret)
			.field("approval_ceiling", &self.approval_ceiling)
			.finish()
	}
}

/// Opaque failure reported by a [`LoginProvider`].
#[derive(Debug, ThisError)]
pub enum LoginError {
	/// Out-of-band approval did not arrive before the ceiling.
	#[error("Out-of-band approval was not granted within {ceiling:?}.")]
	ApprovalTimeout {
		/// Ceiling that elapsed.
		ceiling: StdDuration,
	},
	/// The portal rejected the credentials or the approval was denied.
	#[error("Portal rejected the login: {reason}.")]
	Rejected {
		/// Provider-supplied reason.
		reason: String,
	},
	/// Browser automation (or whatever drives the login) broke.
	#[error("Login automation failed: {message}.")]
	Automation {
		/// Provider-supplied detail.
		message: String,
	},
	/// Network failure while talking to the portal.
	#[error("Network error occurred during login.")]
	Network {
		/// Transport-specific error.
		#[source]
		source: BoxError,
	},
	/// The login task stopped before producing a result.
	#[error("Login task ended before producing a result.")]
	Aborted,
}
impl LoginError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns `true` when the failure was an approval timeout.
	pub fn is_approval_timeout(&self) -> bool {
		matches!(self, Self::ApprovalTimeout { .. })
	}
}
