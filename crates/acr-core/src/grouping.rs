//! Clustered output of the summarizer.

use serde::{Deserialize, Serialize};

/// Maximum length an excerpt should carry; preserved by whatever builds the
/// messages (the summarizer backend), enforced nowhere here since the
/// backend's output is the boundary we trust but don't re-validate byte for
/// byte. Kept as a documented constant for callers that want to pre-truncate.
pub const EXCERPT_SOFT_CAP_CHARS: usize = 200;

/// One clustered issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingGroup {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(rename = "reviewer_count", default)]
    pub reviewer_count: u32,
    #[serde(default)]
    pub sources: Vec<usize>,
}

/// `{ findings: [...], info: [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedFindings {
    #[serde(default)]
    pub findings: Vec<FindingGroup>,
    #[serde(default)]
    pub info: Vec<FindingGroup>,
}

impl GroupedFindings {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty() && self.info.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_findings_decodes_snake_case_reviewer_count() {
        let json = r#"{
            "findings": [
                {"title": "t", "summary": "s", "messages": ["a.go:1"], "reviewer_count": 2, "sources": [0, 1]}
            ],
            "info": []
        }"#;
        let decoded: GroupedFindings = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.findings.len(), 1);
        assert_eq!(decoded.findings[0].reviewer_count, 2);
        assert_eq!(decoded.findings[0].sources, vec![0, 1]);
    }

    #[test]
    fn grouped_findings_defaults_missing_fields() {
        let decoded: GroupedFindings = serde_json::from_str("{}").unwrap();
        assert!(decoded.is_empty());
    }
}
