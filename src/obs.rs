//! Optional observability helpers for presigner operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `sts_presigner.op` with the `op` and `stage`
//!   fields, plus the refresh-failure, persistence-failure, and missing-runtime events.
//! - Enable `metrics` to increment the `sts_presigner_operation_total` counter for every
//!   attempt/outcome, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the presigner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Credential refresh against the issuing endpoint.
	Refresh,
	/// URL signing.
	Sign,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Refresh => "refresh",
			OperationKind::Sign => "sign",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a presigner operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure recovered locally.
	Failure,
	/// Waited on a refresh another caller started.
	Joined,
	/// Skipped because the failure cooldown is active.
	CoolingDown,
	/// Signing declined because no usable credential is cached.
	Unusable,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
			OperationOutcome::Joined => "joined",
			OperationOutcome::CoolingDown => "cooling_down",
			OperationOutcome::Unusable => "unusable",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
