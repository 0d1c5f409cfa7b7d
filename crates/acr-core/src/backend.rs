//! The backend/parser capability set: explicit traits instead of relying on
//! structural typing, with a registry built once at startup and shared
//! read-only across reviewers.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::Result;

use crate::cancel::CancellationRx;
use crate::execution::ExecutionResult;
use crate::finding::Finding;
use crate::grouping::GroupedFindings;
use crate::review::ReviewConfig;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a summarize-style call (used by both the Summarizer and the
/// FP Filter) needs besides the backend itself.
pub struct SummaryRequest {
    pub prompt: String,
    pub input: Vec<u8>,
    pub work_dir: PathBuf,
}

/// One LLM command-line backend, consumed via subprocess.
///
/// Driver instances are stateless and shared read-only across every
/// reviewer id mapped to them; `&self` methods never mutate shared state.
pub trait Backend: Send + Sync {
    /// Stable identifier used for round-robin assignment, registry lookup,
    /// and parser selection.
    fn name(&self) -> &'static str;

    /// Checks the backend's binary is present on `PATH`.
    fn available<'a>(&'a self) -> BoxFuture<'a, Result<()>>;

    /// Spawns a review invocation for the given config. `cancel` is the
    /// per-reviewer signal; firing it (e.g. on timeout) causes the runner's
    /// close path to kill the whole child process group.
    fn execute_review<'a>(
        &'a self,
        config: ReviewConfig,
        cancel: CancellationRx,
    ) -> BoxFuture<'a, Result<ExecutionResult>>;

    /// Spawns a summarize invocation, used by both the Summarizer (C8) and
    /// the FP Filter (C9). Never applies a JSON-schema constraint -- those
    /// two callers use different output shapes and must share this
    /// unconstrained path.
    fn execute_summary<'a>(
        &'a self,
        request: SummaryRequest,
        cancel: CancellationRx,
    ) -> BoxFuture<'a, Result<ExecutionResult>>;

    /// Exit codes this backend is known to use for authentication failures,
    /// consulted alongside stderr pattern matching.
    fn auth_exit_codes(&self) -> &'static [i32] {
        &[]
    }
}

/// Per-backend streaming parser producing `Finding`s from a review call's
/// stdout. Genuinely streaming parsers (JSONL, plain-text) pull one line at
/// a time; buffered parsers (single JSON blob) read everything on the first
/// call and are exhausted after.
pub trait ReviewParser: Send {
    /// Returns the next finding, or `Ok(None)` at end-of-stream. Recoverable
    /// parse errors (a malformed line, stray prose) are absorbed internally
    /// and counted in `parse_errors`; only a fatal error (I/O failure,
    /// oversized line) is returned as `Err`.
    fn read_finding<'a>(&'a mut self) -> BoxFuture<'a, Result<Option<Finding>>>;

    /// Count of recoverable parse errors seen so far.
    fn parse_errors(&self) -> u32;
}

/// Per-backend structured parser producing `GroupedFindings` from a whole
/// summarize-call stdout buffer.
pub trait SummaryParser: Send + Sync {
    /// Unwraps the backend-specific envelope and decodes the inner document.
    fn parse(&self, bytes: &[u8]) -> Result<GroupedFindings>;

    /// Unwraps the envelope only, returning the raw inner JSON text for
    /// reuse by a second caller (the FP filter) without re-invoking the
    /// backend.
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}
