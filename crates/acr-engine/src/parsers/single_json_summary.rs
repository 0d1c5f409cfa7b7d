//! Summary parser for the single-shot backend: the whole response lives in
//! a `response` string field, possibly fenced.

use acr_core::{GroupedFindings, SummaryParser};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use super::fence::strip_markdown_code_fence;

#[derive(Deserialize)]
struct Envelope {
    response: Option<String>,
}

pub struct SingleJsonSummaryParser;

impl SummaryParser for SingleJsonSummaryParser {
    fn parse(&self, bytes: &[u8]) -> Result<GroupedFindings> {
        let inner = self.extract_text(bytes)?;
        serde_json::from_str(&inner).context("decoding grouped findings from 'response' field")
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let envelope: Envelope = serde_json::from_slice(bytes).context("decoding single-shot summary envelope")?;
        let response = envelope
            .response
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("summary envelope missing a 'response' field"))?;
        Ok(strip_markdown_code_fence(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fenced_response_field() {
        let json = r#"{"response":"```json\n{\"findings\":[],\"info\":[]}\n```"}"#;
        let parser = SingleJsonSummaryParser;
        let grouped = parser.parse(json.as_bytes()).unwrap();
        assert!(grouped.is_empty());
    }

    #[test]
    fn rejects_missing_response_field() {
        let parser = SingleJsonSummaryParser;
        assert!(parser.parse(b"{}").is_err());
    }
}
