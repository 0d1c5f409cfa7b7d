//! Line-oriented parser for a backend that just prints prose: one finding
//! per non-empty, non-heading line, filtered against a fixed "all clean"
//! blocklist.

use acr_core::{BoxFuture, Finding, ReviewParser};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;

use super::fence::is_blocklisted;

const READ_BUFFER_BYTES: usize = 64 * 1024;
const MAX_LINE_BYTES: usize = 100 * 1024 * 1024;

pub struct PlainTextReviewParser {
    reviewer_id: u32,
    reader: BufReader<ChildStdout>,
}

impl PlainTextReviewParser {
    pub fn new(stdout: ChildStdout, reviewer_id: u32) -> Self {
        Self {
            reviewer_id,
            reader: BufReader::with_capacity(READ_BUFFER_BYTES, stdout),
        }
    }
}

impl ReviewParser for PlainTextReviewParser {
    fn read_finding<'a>(&'a mut self) -> BoxFuture<'a, Result<Option<Finding>>> {
        Box::pin(async move {
            loop {
                let mut line = String::new();
                let bytes_read = self
                    .reader
                    .read_line(&mut line)
                    .await
                    .context("reading plain-text review stream")?;
                if bytes_read == 0 {
                    return Ok(None);
                }
                if line.len() > MAX_LINE_BYTES {
                    anyhow::bail!("line exceeded {MAX_LINE_BYTES} bytes");
                }
                let trimmed = line.trim();
                if trimmed.is_empty()
                    || trimmed.starts_with('#')
                    || trimmed.starts_with("---")
                    || trimmed.starts_with("```")
                {
                    continue;
                }
                if is_blocklisted(trimmed) {
                    continue;
                }
                return Ok(Some(Finding::new(trimmed, self.reviewer_id)));
            }
        })
    }

    fn parse_errors(&self) -> u32 {
        0
    }
}
