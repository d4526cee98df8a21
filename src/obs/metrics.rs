//! Counters exported through the global `metrics` recorder when the `metrics` feature is on.
//!
//! Without the feature every function compiles to a no-op, so call sites never need `cfg`s.

// self
use crate::{
	error::LockKind,
	obs::{FlowKind, FlowOutcome},
};

/// Counter incremented once per flow attempt and once per outcome.
pub const FLOW_TOTAL: &str = "session_broker_flow_total";
/// Counter incremented whenever a request gives up on the identity lock or the login gate.
pub const LOCK_TIMEOUT_TOTAL: &str = "session_broker_lock_timeout_total";

/// Records a flow outcome, labeled by `flow` and `outcome`.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records a lock or gate timeout, labeled by `lock`.
pub fn record_lock_timeout(lock: LockKind) {
	#[cfg(feature = "metrics")]
	metrics::counter!(LOCK_TIMEOUT_TOTAL, "lock" => lock.as_str()).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = lock;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_are_noops_without_a_recorder() {
		record_flow_outcome(FlowKind::Login, FlowOutcome::Failure);
		record_lock_timeout(LockKind::Gate);

		assert_ne!(FLOW_TOTAL, LOCK_TIMEOUT_TOTAL);
	}
}
