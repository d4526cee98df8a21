//! Session validation: a cheap probe that asks the portal whether a credential set is still
//! accepted.
//!
//! Validation is fail-closed. Anything other than an explicit success (transport errors,
//! unexpected statuses, redirects) counts as invalid, so an ambiguous answer never lets a
//! possibly revoked session through.

#[cfg(feature = "reqwest")] pub mod probe;
#[cfg(feature = "reqwest")] pub use probe::*;

// self
use crate::{
	_prelude::*,
	auth::{Identity, Session},
};

/// Boxed future returned by [`SessionValidator::is_valid`].
pub type ValidationFuture<'a> = Pin<Box<dyn Future<Output = bool> + 'a + Send>>;

/// Stateless check of whether the portal still accepts a session.
pub trait SessionValidator
where
	Self: Send + Sync,
{
	/// Resolves to `true` only when the session is known to be accepted.
	///
	/// Implementations must not retry internally and must resolve to `false` on any error.
	fn is_valid<'a>(
		&'a self,
		session: &'a Session,
		identity: &'a Identity,
	) -> ValidationFuture<'a>;
}

/// Classified result of one validation probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeVerdict {
	/// HTTP 200 and the body contained an expected content marker.
	Confirmed,
	/// HTTP 200 without any expected marker; trusted optimistically.
	Unconfirmed,
	/// The portal refused the credentials (401/403).
	Rejected {
		/// Response status.
		status: u16,
	},
	/// The portal redirected, typically to its login page.
	Redirected {
		/// Response status.
		status: u16,
		/// `Location` header, when present.
		location: Option<String>,
	},
	/// Any other status.
	Unexpected {
		/// Response status.
		status: u16,
	},
	/// The request or body read failed (timeout, DNS, TLS, reset).
	Transport {
		/// Human-readable failure.
		message: String,
	},
	/// The session had no credential pairs to send.
	Empty,
}
impl ProbeVerdict {
	/// Classifies an HTTP response.
	///
	/// `body` is only consulted for status 200.
	pub fn classify(status: u16, location: Option<&str>, body: &str, markers: &[String]) -> Self {
		match status {
			200 if markers.iter().any(|marker| body.contains(marker.as_str())) => Self::Confirmed,
			200 => Self::Unconfirmed,
			401 | 403 => Self::Rejected { status },
			300..=399 => Self::Redirected { status, location: location.map(ToOwned::to_owned) },
			_ => Self::Unexpected { status },
		}
	}

	/// Returns `true` for the verdicts that allow the session to be used.
	pub fn is_valid(&self) -> bool {
		matches!(self, Self::Confirmed | Self::Unconfirmed)
	}

	/// Returns a stable label suitable for log fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Confirmed => "confirmed",
			Self::Unconfirmed => "unconfirmed",
			Self::Rejected { .. } => "rejected",
			Self::Redirected { .. } => "redirected",
			Self::Unexpected { .. } => "unexpected",
			Self::Transport { .. } => "transport",
			Self::Empty => "empty",
		}
	}
}
impl Display for ProbeVerdict {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
