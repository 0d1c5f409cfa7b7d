//! Streaming JSONL event parser, shared by the review and summary paths of
//! the exec-style backend: one `agent_message` item per emitted line.

use acr_core::{BoxFuture, Finding, GroupedFindings, ReviewParser, SummaryParser};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;

use super::fence::strip_markdown_code_fence;

const READ_BUFFER_BYTES: usize = 64 * 1024;
const MAX_LINE_BYTES: usize = 100 * 1024 * 1024;

#[derive(Deserialize)]
struct JsonlEvent {
    item: Option<JsonlItem>,
}

#[derive(Deserialize)]
struct JsonlItem {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// Reads one `Finding` per `agent_message` event; everything else on the
/// stream (reasoning events, tool calls, malformed lines) is skipped and,
/// for malformed lines, counted.
pub struct JsonlReviewParser {
    reviewer_id: u32,
    reader: BufReader<ChildStdout>,
    parse_errors: u32,
}

impl JsonlReviewParser {
    pub fn new(stdout: ChildStdout, reviewer_id: u32) -> Self {
        Self {
            reviewer_id,
            reader: BufReader::with_capacity(READ_BUFFER_BYTES, stdout),
            parse_errors: 0,
        }
    }
}

impl ReviewParser for JsonlReviewParser {
    fn read_finding<'a>(&'a mut self) -> BoxFuture<'a, Result<Option<Finding>>> {
        Box::pin(async move {
            loop {
                let mut line = String::new();
                let bytes_read = self
                    .reader
                    .read_line(&mut line)
                    .await
                    .context("reading JSONL review stream")?;
                if bytes_read == 0 {
                    return Ok(None);
                }
                if line.len() > MAX_LINE_BYTES {
                    anyhow::bail!("JSONL line exceeded {MAX_LINE_BYTES} bytes");
                }
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<JsonlEvent>(trimmed) {
                    Ok(event) => {
                        if let Some(finding) = agent_message_finding(event, self.reviewer_id) {
                            return Ok(Some(finding));
                        }
                    }
                    Err(_) => self.parse_errors += 1,
                }
            }
        })
    }

    fn parse_errors(&self) -> u32 {
        self.parse_errors
    }
}

fn agent_message_finding(event: JsonlEvent, reviewer_id: u32) -> Option<Finding> {
    let item = event.item?;
    if item.kind != "agent_message" {
        return None;
    }
    let text = item.text?;
    if text.trim().is_empty() {
        return None;
    }
    Some(Finding::new(text, reviewer_id))
}

/// Extracts the last `agent_message` text on the stream and treats it as the
/// whole summarize-call response, stripping a markdown fence if present.
pub struct JsonlSummaryParser;

impl SummaryParser for JsonlSummaryParser {
    fn parse(&self, bytes: &[u8]) -> Result<GroupedFindings> {
        let text = self.extract_text(bytes)?;
        serde_json::from_str(&text).context("decoding grouped findings from JSONL event stream")
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let content = String::from_utf8_lossy(bytes);
        let mut last_text = None;
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Ok(event) = serde_json::from_str::<JsonlEvent>(trimmed) {
                if let Some(item) = event.item {
                    if item.kind == "agent_message" {
                        if let Some(text) = item.text {
                            last_text = Some(text);
                        }
                    }
                }
            }
        }
        let text = last_text.ok_or_else(|| anyhow!("no agent_message event found on JSONL stream"))?;
        Ok(strip_markdown_code_fence(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;

    async fn stdout_from(script: &str) -> ChildStdout {
        let mut child = tokio::process::Command::new("sh")
            .args(["-c", script])
            .stdout(Stdio::piped())
            .spawn()
            .expect("spawn sh");
        child.stdout.take().expect("stdout piped")
    }

    #[tokio::test]
    async fn reads_findings_from_agent_message_events_only() {
        let script = r#"
            echo '{"item":{"type":"reasoning","text":"thinking"}}'
            echo '{"item":{"type":"agent_message","text":"leak in pool.rs"}}'
            echo 'not json at all'
            echo '{"item":{"type":"agent_message","text":"missing bound check"}}'
        "#;
        let stdout = stdout_from(script).await;
        let mut parser = JsonlReviewParser::new(stdout, 1);

        let first = parser.read_finding().await.unwrap().unwrap();
        assert_eq!(first.text, "leak in pool.rs");
        let second = parser.read_finding().await.unwrap().unwrap();
        assert_eq!(second.text, "missing bound check");
        assert!(parser.read_finding().await.unwrap().is_none());
        assert_eq!(parser.parse_errors(), 1);
    }

    #[test]
    fn summary_parser_takes_last_agent_message_and_strips_fence() {
        let stream = concat!(
            "{\"item\":{\"type\":\"agent_message\",\"text\":\"stale\"}}\n",
            "{\"item\":{\"type\":\"agent_message\",\"text\":\"```json\\n{\\\"findings\\\":[]}\\n```\"}}\n",
        );
        let parser = JsonlSummaryParser;
        let grouped = parser.parse(stream.as_bytes()).unwrap();
        assert!(grouped.findings.is_empty());
    }
}
