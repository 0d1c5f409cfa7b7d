//! Core domain model and backend/parser contracts for the review
//! orchestrator: no process spawning, no I/O beyond what `ExecutionResult`
//! needs to reap a child, no knowledge of any concrete backend.

pub mod backend;
pub mod cancel;
pub mod disposition;
pub mod execution;
pub mod finding;
pub mod grouping;
pub mod registry;
pub mod review;

pub use backend::{Backend, BoxFuture, ReviewParser, SummaryParser, SummaryRequest};
pub use cancel::{Cancellation, CancellationRx};
pub use disposition::{build_dispositions, Disposition, FpVerdict};
pub use execution::{CappedBuffer, ExecutionResult, ExitCode, STDERR_CAPTURE_CAP};
pub use finding::{aggregate, AggregatedFinding, Finding};
pub use grouping::{FindingGroup, GroupedFindings, EXCERPT_SOFT_CAP_CHARS};
pub use registry::{BackendRegistry, ParserRegistry};
pub use review::{ReviewConfig, ReviewStats, ReviewerResult};

/// Gate for the debug-only stderr tracing used throughout this workspace
/// instead of a logging crate: cheap to check, and off by default so a
/// normal run stays quiet.
pub fn debug_enabled() -> bool {
    std::env::var("ACR_DEBUG").map(|v| v != "0" && !v.is_empty()).unwrap_or(false)
}
