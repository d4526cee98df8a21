//! Fire-and-forget status notifications about login progress.
//!
//! The broker reports three lifecycle points for every login it runs: approval needed,
//! success, and failure. Delivery is best effort; a [`Notifier`] error (or panic) is logged
//! and otherwise ignored so it can never change the outcome of a session request.

// std
use std::panic::{self, AssertUnwindSafe};
// crates.io
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
// self
use crate::{_prelude::*, auth::Identity};

/// Delivery channel for user-facing status messages.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Queues `notification` for delivery. Must not block on I/O.
	fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Failure reported by a [`Notifier`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum NotifyError {
	/// The receiving side of the delivery channel is gone.
	#[error("Notification channel is closed.")]
	Closed,
	/// The transport refused the message.
	#[error("Notification delivery failed: {message}.")]
	Delivery {
		/// Transport-supplied detail.
		message: String,
	},
}

/// Message category, mirrored to the front end so it can style and prioritize the notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
	/// Informational progress.
	Info,
	/// Something degraded but the request continues.
	Warning,
	/// A login completed and a fresh session is cached.
	Success,
	/// A login or validation failed.
	Error,
	/// The user must confirm the login out of band (e.g. approve a 2FA push).
	ApprovalRequired,
}
impl NotificationCategory {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			NotificationCategory::Info => "info",
			NotificationCategory::Warning => "warning",
			NotificationCategory::Success => "success",
			NotificationCategory::Error => "error",
			NotificationCategory::ApprovalRequired => "approval_required",
		}
	}
}
impl Display for NotificationCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A status message addressed to one identity.
///
/// Serializes to the `auth` notification payload consumed by the web front end:
/// `{"type":"auth","identity":..,"category":..,"message":..,"requires_action":..,"timestamp":..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "auth")]
pub struct Notification {
	/// Recipient identity.
	pub identity: Identity,
	/// Category of the message.
	pub category: NotificationCategory,
	/// Human-readable text.
	pub message: String,
	/// Whether the recipient has to act (approve a prompt) for the flow to continue.
	pub requires_action: bool,
	/// Instant the notification was produced.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}
impl Notification {
	/// Creates a notification stamped with the current clock.
	pub fn new(
		identity: Identity,
		category: NotificationCategory,
		message: impl Into<String>,
	) -> Self {
		Self {
			identity,
			category,
			message: message.into(),
			requires_action: matches!(category, NotificationCategory::ApprovalRequired),
			timestamp: OffsetDateTime::now_utc(),
		}
	}

	/// Renders the front-end JSON payload.
	pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
		serde_json::to_value(self)
	}
}

/// Notifier that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;
impl Notifier for NoopNotifier {
	fn notify(&self, _: Notification) -> Result<(), NotifyError> {
		Ok(())
	}
}

/// Notifier that only records messages as `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
		tracing::info!(
			identity = %notification.identity,
			category = notification.category.as_str(),
			requires_action = notification.requires_action,
			"{}",
			notification.message,
		);

		Ok(())
	}
}

/// Notifier that forwards messages to an unbounded channel drained by a transport task
/// (websocket fan-out, push service, ...).
#[derive(Clone, Debug)]
pub struct ChannelNotifier(UnboundedSender<Notification>);
impl ChannelNotifier {
	/// Creates a notifier and the receiver the delivery task should drain.
	pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
		let (tx, rx) = mpsc::unbounded_channel();

		(Self(tx), rx)
	}
}
impl Notifier for ChannelNotifier {
	fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
		self.0.send(notification).map_err(|_| NotifyError::Closed)
	}
}

/// Hands `notification` to `notifier`; errors and panics are logged and swallowed.
pub(crate) fn deliver(notifier: &dyn Notifier, notification: Notification) {
	let category = notification.category;
	let delivered = panic::catch_unwind(AssertUnwindSafe(|| notifier.notify(notification)));

	match delivered {
		Ok(Ok(())) => {},
		Ok(Err(err)) => {
			tracing::warn!(category = category.as_str(), error = %err, "Notification dropped.");
		},
		Err(_) => {
			tracing::warn!(
				category = category.as_str(),
				"Notifier panicked; notification dropped."
			);
		},
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn identity() -> Identity {
		Identity::new("abc12x").expect("Identity fixture should be valid.")
	}

	#[test]
	fn approval_notices_require_action() {
		let approval =
			Notification::new(identity(), NotificationCategory::ApprovalRequired, "Check phone");
		let success = Notification::new(identity(), NotificationCategory::Success, "Done");

		assert!(approval.requires_action);
		assert!(!success.requires_action);
	}

	#[test]
	fn payload_matches_front_end_shape() {
		let payload = Notification::new(identity(), NotificationCategory::Error, "Login failed")
			.to_json()
			.expect("Notification should serialize.");

		assert_eq!(payload["type"], "auth");
		assert_eq!(payload["identity"], "abc12x");
		assert_eq!(payload["category"], "error");
		assert_eq!(payload["message"], "Login failed");
		assert_eq!(payload["requires_action"], false);
		assert!(payload["timestamp"].is_string());
	}

	#[test]
	fn channel_notifier_reports_closed_receiver() {
		let (notifier, mut rx) = ChannelNotifier::channel();

		notifier
			.notify(Notification::new(identity(), NotificationCategory::Info, "hello"))
			.expect("Open channel should accept notifications.");

		assert_eq!(rx.try_recv().map(|n| n.message).ok().as_deref(), Some("hello"));

		drop(rx);

		assert_eq!(
			notifier.notify(Notification::new(identity(), NotificationCategory::Info, "lost")),
			Err(NotifyError::Closed)
		);
	}

	#[test]
	fn deliver_swallows_notifier_panics() {
		struct Exploding;
		impl Notifier for Exploding {
			fn notify(&self, _: Notification) -> Result<(), NotifyError> {
				panic!("transport exploded")
			}
		}

		deliver(&Exploding, Notification::new(identity(), NotificationCategory::Info, "hello"));
		deliver(&NoopNotifier, Notification::new(identity(), NotificationCategory::Info, "hello"));
	}
}
