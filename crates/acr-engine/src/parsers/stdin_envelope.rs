//! Summary parser for the stdin-diff backend's `--output-format json`
//! envelope: prefer the `result` string, fall back to an already-structured
//! `structured_output` object.

use acr_core::{GroupedFindings, SummaryParser};
use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::fence::strip_markdown_code_fence;

#[derive(Deserialize)]
struct Envelope {
    result: Option<String>,
    structured_output: Option<serde_json::Value>,
}

pub struct StdinEnvelopeSummaryParser;

impl SummaryParser for StdinEnvelopeSummaryParser {
    fn parse(&self, bytes: &[u8]) -> Result<GroupedFindings> {
        let envelope: Envelope = serde_json::from_slice(bytes).context("decoding stdin-diff summary envelope")?;

        if let Some(result) = envelope.result.filter(|s| !s.trim().is_empty()) {
            let inner = strip_markdown_code_fence(&result);
            return serde_json::from_str(&inner).context("decoding grouped findings from 'result' field");
        }
        if let Some(structured) = envelope.structured_output.filter(|v| !v.is_null()) {
            return serde_json::from_value(structured)
                .context("decoding grouped findings from 'structured_output' field");
        }
        bail!("summary envelope has neither a usable 'result' nor 'structured_output' field");
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let envelope: Envelope = serde_json::from_slice(bytes).context("decoding stdin-diff summary envelope")?;
        if let Some(result) = envelope.result.filter(|s| !s.trim().is_empty()) {
            return Ok(strip_markdown_code_fence(&result));
        }
        if let Some(structured) = envelope.structured_output.filter(|v| !v.is_null()) {
            return Ok(structured.to_string());
        }
        bail!("summary envelope has neither a usable 'result' nor 'structured_output' field");
    }
}
