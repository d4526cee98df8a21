//! Broker timing configuration: cache TTL and the bounds on every wait the broker performs.

// self
use crate::{_prelude::*, error::ConfigError};

/// Named, overridable timing constants.
///
/// Serialized form uses (fractional) seconds for every field, e.g.
/// `{"ttl": 1800, "lock_timeout": 10, "gate_timeout": 0.5}`. Missing fields take their defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
	/// How long a freshly validated session may be served from cache.
	#[serde(with = "secs")]
	pub ttl: StdDuration,
	/// Bound on acquiring the per-identity refresh mutex.
	#[serde(with = "secs")]
	pub lock_timeout: StdDuration,
	/// Bound on waiting for another caller's in-progress refresh before trying ourselves.
	#[serde(with = "secs")]
	pub in_progress_wait_timeout: StdDuration,
	/// Bound on acquiring the global login gate.
	#[serde(with = "secs")]
	pub gate_timeout: StdDuration,
	/// Bound on a single login, including out-of-band approval.
	#[serde(with = "secs")]
	pub approval_ceiling: StdDuration,
}
impl BrokerConfig {
	/// Default session TTL (30 minutes).
	pub const DEFAULT_TTL: StdDuration = StdDuration::from_secs(30 * 60);
	/// Default identity lock timeout (10 seconds).
	pub const DEFAULT_LOCK_TIMEOUT: StdDuration = StdDuration::from_secs(10);
	/// Default in-progress wait timeout (60 seconds).
	pub const DEFAULT_IN_PROGRESS_WAIT_TIMEOUT: StdDuration = StdDuration::from_secs(60);
	/// Default login gate timeout (120 seconds).
	pub const DEFAULT_GATE_TIMEOUT: StdDuration = StdDuration::from_secs(120);
	/// Default approval ceiling (240 seconds).
	pub const DEFAULT_APPROVAL_CEILING: StdDuration = StdDuration::from_secs(240);

	/// Parses a JSON document, filling missing fields with defaults.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(raw)?)
	}

	/// Overrides the session TTL.
	pub fn with_ttl(mut self, ttl: StdDuration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Overrides the identity lock timeout.
	pub fn with_lock_timeout(mut self, timeout: StdDuration) -> Self {
		self.lock_timeout = timeout;

		self
	}

	/// Overrides the in-progress wait timeout.
	pub fn with_in_progress_wait_timeout(mut self, timeout: StdDuration) -> Self {
		self.in_progress_wait_timeout = timeout;

		self
	}

	/// Overrides the login gate timeout.
	pub fn with_gate_timeout(mut self, timeout: StdDuration) -> Self {
		self.gate_timeout = timeout;

		self
	}

	/// Overrides the approval ceiling.
	pub fn with_approval_ceiling(mut self, ceiling: StdDuration) -> Self {
		self.approval_ceiling = ceiling;

		self
	}
}
impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			ttl: Self::DEFAULT_TTL,
			lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
			in_progress_wait_timeout: Self::DEFAULT_IN_PROGRESS_WAIT_TIMEOUT,
			gate_timeout: Self::DEFAULT_GATE_TIMEOUT,
			approval_ceiling: Self::DEFAULT_APPROVAL_CEILING,
		}
	}
}

mod secs {
	// crates.io
	use serde::{Deserializer, Serializer, de::Error as _};
	// self
	use crate::_prelude::*;

	pub(super) fn serialize<S>(value: &StdDuration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_f64(value.as_secs_f64())
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<StdDuration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = f64::deserialize(deserializer)?;

		StdDuration::try_from_secs_f64(raw).map_err(|_| {
			D::Error::custom(format!("expected a non-negative number of seconds, got {raw}"))
		})
	}
}
