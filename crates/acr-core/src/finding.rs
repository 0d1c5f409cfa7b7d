//! Raw reviewer observations and their text-keyed aggregation across
//! reviewers.

use serde::{Deserialize, Serialize};

/// One raw observation emitted by one reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Trimmed, non-empty text of the observation.
    pub text: String,
    /// 1-based reviewer identifier.
    pub reviewer_id: u32,
}

impl Finding {
    pub fn new(text: impl Into<String>, reviewer_id: u32) -> Self {
        Self {
            text: text.into(),
            reviewer_id,
        }
    }

    /// Trims `text` and reports whether the finding is usable; findings with
    /// empty text are dropped before reaching the aggregator.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One equivalence class of textually-identical findings across reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedFinding {
    pub text: String,
    /// Sorted, deduplicated reviewer ids that produced this text.
    pub reviewers: Vec<u32>,
}

/// Text-keyed dedup of findings across reviewers.
///
/// Preserves first-seen order of distinct texts; empty texts are dropped;
/// within an entry, reviewer ids are unique and ascending. Ordering within
/// a single reviewer's own findings (as produced by that reviewer's
/// streaming parser) is preserved because we walk the input in arrival
/// order and only ever append to a bucket.
pub fn aggregate(findings: &[Finding]) -> Vec<AggregatedFinding> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: std::collections::HashMap<String, Vec<u32>> =
        std::collections::HashMap::new();

    for finding in findings {
        let text = finding.text.trim();
        if text.is_empty() {
            continue;
        }
        let bucket = buckets.entry(text.to_string()).or_insert_with(|| {
            order.push(text.to_string());
            Vec::new()
        });
        if !bucket.contains(&finding.reviewer_id) {
            bucket.push(finding.reviewer_id);
        }
    }

    order
        .into_iter()
        .map(|text| {
            let mut reviewers = buckets.remove(&text).unwrap_or_default();
            reviewers.sort_unstable();
            AggregatedFinding { text, reviewers }
        })
        .collect()
}
