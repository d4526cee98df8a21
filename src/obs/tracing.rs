// crates.io
use tracing::{Span, instrument::Instrumented};
// self
use crate::{_prelude::*, auth::Identity, obs::FlowKind};

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the flow kind, stage, and identity.
	pub fn new(kind: FlowKind, stage: &'static str, identity: &Identity) -> Self {
		let span = tracing::info_span!(
			"session_broker.flow",
			flow = kind.as_str(),
			stage,
			identity = %identity,
		);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		tracing::Instrument::instrument(fut, self.span.clone())
	}
}
