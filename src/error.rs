//! Broker-level error types shared across the store, coordinator, and login orchestration.

// self
use crate::{_prelude::*, auth::Identity, login::LoginError};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The identity mutex or the global login gate could not be acquired in time.
	#[error("Timed out after {waited:?} waiting for the {lock} lock while serving `{identity}`.")]
	LockTimeout {
		/// Identity whose request gave up.
		identity: Identity,
		/// Which lock was contended.
		lock: LockKind,
		/// Configured bound that elapsed.
		waited: StdDuration,
	},
	/// The login provider failed (network, automation, or approval timeout).
	#[error("Login provider failed for `{identity}`.")]
	LoginProvider {
		/// Identity the login was performed for.
		identity: Identity,
		/// Opaque failure reported by the provider.
		#[source]
		source: LoginError,
	},
	/// A freshly issued session was rejected by the validator.
	#[error("Freshly issued session for `{identity}` was rejected by the validator.")]
	ValidationFailure {
		/// Identity whose new session failed validation.
		identity: Identity,
	},
	/// No path produced a usable session.
	#[error("No usable session is available for `{identity}`.")]
	NoCredentialsAvailable {
		/// Identity left without credentials.
		identity: Identity,
	},
}
impl Error {
	/// Returns the identity the failed request was made for, if the error is request-scoped.
	pub fn identity(&self) -> Option<&Identity> {
		match self {
			Self::Config(_) => None,
			Self::LockTimeout { identity, .. }
			| Self::LoginProvider { identity, .. }
			| Self::ValidationFailure { identity }
			| Self::NoCredentialsAvailable { identity } => Some(identity),
		}
	}

	/// Returns `true` for [`Error::LockTimeout`].
	pub fn is_lock_timeout(&self) -> bool {
		matches!(self, Self::LockTimeout { .. })
	}
}

/// Lock labels carried by [`Error::LockTimeout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
	/// The per-identity refresh mutex.
	Identity,
	/// The process-wide login gate.
	Gate,
}
impl LockKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LockKind::Identity => "identity",
			LockKind::Gate => "login gate",
		}
	}
}
impl Display for LockKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Configuration document could not be parsed.
	#[error("Broker configuration is malformed.")]
	Malformed(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::config::BrokerConfig;

	#[test]
	fn lock_timeout_message_names_lock_and_identity() {
		let identity = Identity::new("alice").expect("Identity fixture should be valid.");
		let err = Error::LockTimeout {
			identity,
			lock: LockKind::Gate,
			waited: StdDuration::from_secs(120),
		};

		assert!(err.is_lock_timeout());
		assert_eq!(err.identity().map(Identity::as_str), Some("alice"));
		assert_eq!(
			err.to_string(),
			"Timed out after 120s waiting for the login gate lock while serving `alice`."
		);
	}

	#[test]
	fn login_failure_exposes_provider_error_as_source() {
		let identity = Identity::new("bob").expect("Identity fixture should be valid.");
		let err = Error::LoginProvider {
			identity,
			source: LoginError::Rejected { reason: "bad password".into() },
		};
		let source =
			StdError::source(&err).expect("Login failures should expose the provider error.");

		assert_eq!(source.to_string(), "Portal rejected the login: bad password.");
	}

	#[test]
	fn config_errors_wrap_malformed_documents() {
		let err: Error = BrokerConfig::from_json_str(r#"{"ttl": "soon"}"#)
			.expect_err("Fixture document should be rejected.")
			.into();

		assert!(matches!(err, Error::Config(ConfigError::Malformed(_))));
		assert!(err.identity().is_none());
		assert!(StdError::source(&err).is_some());
	}
}
