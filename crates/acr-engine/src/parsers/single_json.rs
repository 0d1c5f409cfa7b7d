//! Buffered parser for a backend that emits exactly one JSON document (or,
//! failing that, one blob of prose) on stdout and nothing else.

use acr_core::{BoxFuture, Finding, ReviewParser};
use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdout;

use super::fence::is_blocklisted;

const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;
const PREFERRED_FIELDS: &[&str] = &["response", "text", "message", "content", "finding"];

/// Reads the whole stream on its first call and yields at most one finding;
/// every call after that reports end-of-stream.
pub struct SingleJsonReviewParser {
    reviewer_id: u32,
    stdout: Option<ChildStdout>,
}

impl SingleJsonReviewParser {
    pub fn new(stdout: ChildStdout, reviewer_id: u32) -> Self {
        Self {
            reviewer_id,
            stdout: Some(stdout),
        }
    }
}

impl ReviewParser for SingleJsonReviewParser {
    fn read_finding<'a>(&'a mut self) -> BoxFuture<'a, Result<Option<Finding>>> {
        Box::pin(async move {
            let Some(mut stdout) = self.stdout.take() else {
                return Ok(None);
            };

            let mut buf = Vec::new();
            stdout
                .read_to_end(&mut buf)
                .await
                .context("reading single-JSON review stream")?;
            if buf.len() > MAX_BODY_BYTES {
                anyhow::bail!("review output exceeded {MAX_BODY_BYTES} bytes");
            }

            let text = String::from_utf8_lossy(&buf);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }

            if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
                return Ok(value
                    .as_object()
                    .and_then(|obj| {
                        PREFERRED_FIELDS.iter().find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
                    })
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Finding::new(s, self.reviewer_id)));
            }

            if is_blocklisted(trimmed) {
                return Ok(None);
            }
            Ok(Some(Finding::new(trimmed, self.reviewer_id)))
        })
    }

    fn parse_errors(&self) -> u32 {
        0
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
    async fn reads_one_finding_from_response_field() {
        let stdout = stdout_from(r#"printf '{"response":"unchecked unwrap on line 42"}'"#).await;
        let mut parser = SingleJsonReviewParser::new(stdout, 3);
        let finding = parser.read_finding().await.unwrap().unwrap();
        assert_eq!(finding.text, "unchecked unwrap on line 42");
        assert!(parser.read_finding().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn falls_back_to_plain_text_when_not_json() {
        let stdout = stdout_from(r#"printf 'missing null check in handler'"#).await;
        let mut parser = SingleJsonReviewParser::new(stdout, 3);
        let finding = parser.read_finding().await.unwrap().unwrap();
        assert_eq!(finding.text, "missing null check in handler");
    }

    #[tokio::test]
    async fn blocklisted_plain_text_yields_no_finding() {
        let stdout = stdout_from(r#"printf 'No issues found.'"#).await;
        let mut parser = SingleJsonReviewParser::new(stdout, 3);
        assert!(parser.read_finding().await.unwrap().is_none());
    }
}
