// self
use crate::obs::{FlowKind, FlowOutcome};

/// `stage` label used when a failure carries no stage, and for attempts and successes.
const UNSTAGED: &str = "none";

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	increment(kind, outcome, None);
}

/// Records a failure labeled with the step that raised it.
pub fn record_flow_failure(kind: FlowKind, stage: Option<&'static str>) {
	increment(kind, FlowOutcome::Failure, stage);
}

fn increment(kind: FlowKind, outcome: FlowOutcome, stage: Option<&'static str>) {
	let stage = stage_label(stage);

	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"sforce_auth_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str(),
			"stage" => stage
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome, stage);
	}
}

fn stage_label(stage: Option<&'static str>) -> &'static str {
	stage.unwrap_or(UNSTAGED)
}
