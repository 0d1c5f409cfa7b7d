//! Per-reviewer inputs/outputs and run-level stats.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::finding::Finding;

/// Input to a driver's `execute_review`.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub base_ref: String,
    pub work_dir: PathBuf,
    pub reviewer_id: u32,
    pub timeout: Duration,
    /// Force ref-file mode even under the size threshold.
    pub use_ref_file: bool,
    /// Precomputed diff; when absent, a diff-consuming driver fetches its own.
    pub diff: Option<String>,
    /// Steering text appended to the default review prompt.
    pub guidance: Option<String>,
}

impl ReviewConfig {
    pub fn new(base_ref: impl Into<String>, work_dir: PathBuf, reviewer_id: u32) -> Self {
        Self {
            base_ref: base_ref.into(),
            work_dir,
            reviewer_id,
            timeout: Duration::from_secs(300),
            use_ref_file: false,
            diff: None,
            guidance: None,
        }
    }
}

/// Outcome of one reviewer's run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerResult {
    pub reviewer_id: u32,
    pub backend_name: String,
    pub findings: Vec<Finding>,
    pub exit_code: Option<i32>,
    pub parse_errors: u32,
    pub timed_out: bool,
    pub duration: Duration,
    /// Set when the reviewer failed for a reason other than timeout (spawn
    /// failure, transport error, fatal parse error, non-zero exit).
    pub error: Option<String>,
    /// Set when stderr/exit-code heuristics classify the failure as an
    /// authentication problem for this backend.
    pub auth_hint: Option<String>,
}

impl ReviewerResult {
    pub fn failed(&self) -> bool {
        self.error.is_some() && !self.timed_out
    }
}

/// Run-level totals derived by the cohort scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_reviewers: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub per_reviewer_duration: HashMap<u32, Duration>,
    pub backend_counts: HashMap<String, usize>,
    pub wall_clock: Duration,
    pub summarizer_duration: Option<Duration>,
    pub fp_filter_duration: Option<Duration>,
    pub fp_removed_count: usize,
}

impl ReviewStats {
    /// True when every reviewer either failed outright or timed out.
    pub fn all_failed(&self) -> bool {
        self.total_reviewers > 0 && self.failed + self.timed_out >= self.total_reviewers
    }
}
