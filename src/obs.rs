//! Optional observability helpers for OAuth flows and authenticated requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `sforce_auth.flow` with the `flow` (grant)
//!   and `stage` (call site) fields.
//! - Enable `metrics` to increment the `sforce_auth_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow`, `outcome`, and the failing `stage`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, error::RequestStage};

/// Flow kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Interactive (user-agent) grant.
	Interactive,
	/// Refresh token flow.
	Refresh,
	/// Token revocation.
	Revoke,
	/// Authenticated API request issued through a connection.
	Request,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Interactive => "interactive",
			FlowKind::Refresh => "refresh",
			FlowKind::Revoke => "revoke",
			FlowKind::Request => "request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the outcome of `result` for `kind`; failures carry the stage they were annotated with.
pub(crate) fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	match result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(e) => record_flow_failure(kind, e.stage().map(RequestStage::as_str)),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(FlowKind::Interactive.to_string(), "interactive");
		assert_eq!(FlowKind::Revoke.as_str(), "revoke");
		assert_eq!(FlowOutcome::Attempt.to_string(), "attempt");
	}
}
