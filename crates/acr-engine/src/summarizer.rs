//! Clusters aggregated findings into the final grouped-output shape by
//! handing them to a chosen backend's summarize call and decoding its
//! answer. Never propagates a failure as an error: an empty or malformed
//! response becomes an empty `GroupedFindings` plus a diagnostic message the
//! caller can surface.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use acr_core::{AggregatedFinding, Backend, CancellationRx, GroupedFindings, SummaryParser, SummaryRequest};
use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::drivers::GROUPING_PROMPT;

pub struct Summarizer {
    backend: Arc<dyn Backend>,
    parser: Box<dyn SummaryParser>,
}

/// Outcome of a summarize call: the decoded groups (empty on any failure)
/// plus how long it took and, on failure, why.
pub struct SummarizeOutcome {
    pub grouped: GroupedFindings,
    pub duration: Duration,
    pub diagnostic: Option<String>,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn Backend>, parser: Box<dyn SummaryParser>) -> Self {
        Self { backend, parser }
    }

    pub async fn summarize(
        &self,
        aggregated: &[AggregatedFinding],
        work_dir: PathBuf,
        cancel: CancellationRx,
    ) -> SummarizeOutcome {
        let start = Instant::now();

        if aggregated.is_empty() {
            return SummarizeOutcome {
                grouped: GroupedFindings::default(),
                duration: start.elapsed(),
                diagnostic: None,
            };
        }

        match self.try_summarize(aggregated, work_dir, cancel).await {
            Ok(grouped) => SummarizeOutcome {
                grouped,
                duration: start.elapsed(),
                diagnostic: None,
            },
            Err(err) => SummarizeOutcome {
                grouped: GroupedFindings::default(),
                duration: start.elapsed(),
                diagnostic: Some(format!("{err:#}")),
            },
        }
    }

    async fn try_summarize(
        &self,
        aggregated: &[AggregatedFinding],
        work_dir: PathBuf,
        cancel: CancellationRx,
    ) -> Result<GroupedFindings> {
        let input = build_input(aggregated)?;
        let request = SummaryRequest {
            prompt: GROUPING_PROMPT.to_string(),
            input,
            work_dir,
        };

        let mut execution = self.backend.execute_summary(request, cancel).await?;
        let mut buf = Vec::new();
        let read_result = execution.stdout().read_to_end(&mut buf).await;
        execution.close().await;
        read_result.context("reading summarize call output")?;

        self.parser
            .parse(&buf)
            .with_context(|| format!("stderr: {}", execution.stderr()))
    }
}

#[derive(Serialize)]
struct InputItem<'a> {
    id: usize,
    text: &'a str,
    reviewers: &'a [u32],
}

fn build_input(aggregated: &[AggregatedFinding]) -> Result<Vec<u8>> {
    let items: Vec<InputItem> = aggregated
        .iter()
        .enumerate()
        .map(|(id, finding)| InputItem {
            id,
            text: &finding.text,
            reviewers: &finding.reviewers,
        })
        .collect();
    serde_json::to_vec(&items).context("marshalling aggregated findings for the summarizer")
}

#[cfg(test)]
mod tests {
    use super::*;
    use acr_core::{BoxFuture, Cancellation, ExecutionResult, ReviewConfig};

    struct EchoBackend;

    impl Backend for EchoBackend {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn available<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
            Box::pin(async { Ok(()) })
        }

        fn execute_review<'a>(
            &'a self,
            _config: ReviewConfig,
            _cancel: CancellationRx,
        ) -> BoxFuture<'a, Result<ExecutionResult>> {
            Box::pin(async { anyhow::bail!("not used") })
        }

        fn execute_summary<'a>(
            &'a self,
            request: SummaryRequest,
            cancel: CancellationRx,
        ) -> BoxFuture<'a, Result<ExecutionResult>> {
            Box::pin(async move {
                acr_adapters::spawn(acr_adapters::SpawnRequest {
                    program: "cat".to_string(),
                    args: vec![],
                    work_dir: request.work_dir,
                    stdin_data: Some(br#"{"findings":[{"title":"t","summary":"s","messages":[],"reviewer_count":1,"sources":[0]}],"info":[]}"#.to_vec()),
                    cancel,
                    temp_file: None,
                })
                .await
            })
        }
    }

    struct IdentitySummaryParser;

    impl SummaryParser for IdentitySummaryParser {
        fn parse(&self, bytes: &[u8]) -> Result<GroupedFindings> {
            serde_json::from_slice(bytes).context("decoding")
        }

        fn extract_text(&self, bytes: &[u8]) -> Result<String> {
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    #[tokio::test]
    async fn empty_input_short_circuits_without_calling_backend() {
        let summarizer = Summarizer::new(Arc::new(EchoBackend), Box::new(IdentitySummaryParser));
        let cancel = Cancellation::new().receiver();
        let outcome = summarizer.summarize(&[], std::env::temp_dir(), cancel).await;
        assert!(outcome.grouped.is_empty());
        assert!(outcome.diagnostic.is_none());
    }

    #[tokio::test]
    async fn decodes_backend_response_into_grouped_findings() {
        let summarizer = Summarizer::new(Arc::new(EchoBackend), Box::new(IdentitySummaryParser));
        let cancel = Cancellation::new().receiver();
        let aggregated = vec![AggregatedFinding {
            text: "off by one".to_string(),
            reviewers: vec![1, 2],
        }];
        let outcome = summarizer.summarize(&aggregated, std::env::temp_dir(), cancel).await;
        assert!(outcome.diagnostic.is_none());
        assert_eq!(outcome.grouped.findings.len(), 1);
        assert_eq!(outcome.grouped.findings[0].title, "t");
    }

    #[tokio::test]
    async fn unparseable_response_yields_empty_result_with_diagnostic() {
        struct FailingParser;
        impl SummaryParser for FailingParser {
            fn parse(&self, _bytes: &[u8]) -> Result<GroupedFindings> {
                anyhow::bail!("not json")
            }
            fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
                anyhow::bail!("not json")
            }
        }

        let summarizer = Summarizer::new(Arc::new(EchoBackend), Box::new(FailingParser));
        let cancel = Cancellation::new().receiver();
        let aggregated = vec![AggregatedFinding {
            text: "x".to_string(),
            reviewers: vec![1],
        }];
        let outcome = summarizer.summarize(&aggregated, std::env::temp_dir(), cancel).await;
        assert!(outcome.grouped.is_empty());
        assert!(outcome.diagnostic.is_some());
    }
}
