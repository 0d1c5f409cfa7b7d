//! Driver for a backend that takes the diff on stdin and prints its answer
//! on stdout: `<bin> --print -` for review, `<bin> --print --output-format
//! json -` for summarize calls.

use acr_core::{Backend, BoxFuture, CancellationRx, ExecutionResult, ReviewConfig, SummaryRequest};
use acr_adapters::SpawnRequest;
use anyhow::Result;

use super::common::{place_diff, resolve_diff};
use super::prompts::render_review_prompt;

pub struct StdinDriver {
    binary: String,
}

impl StdinDriver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Backend for StdinDriver {
    fn name(&self) -> &'static str {
        "stdin-diff"
    }

    fn available<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { acr_adapters::binary_available(&self.binary) })
    }

    fn execute_review<'a>(&'a self, config: ReviewConfig, cancel: CancellationRx) -> BoxFuture<'a, Result<ExecutionResult>> {
        Box::pin(async move {
            let diff = resolve_diff(&config)?;
            let placement = place_diff(&config, diff)?;
            let prompt = render_review_prompt(placement.as_embed(), config.guidance.as_deref());
            let request = SpawnRequest {
                program: self.binary.clone(),
                args: vec!["--print".to_string(), "-".to_string()],
                work_dir: config.work_dir.clone(),
                stdin_data: Some(prompt.into_bytes()),
                cancel,
                temp_file: placement.owned_temp_file(),
            };
            acr_adapters::spawn(request).await
        })
    }

    fn execute_summary<'a>(&'a self, request: SummaryRequest, cancel: CancellationRx) -> BoxFuture<'a, Result<ExecutionResult>> {
        Box::pin(async move {
            let stdin = super::prompts::render_summary_stdin(&request.prompt, &request.input);
            let spawn_request = SpawnRequest {
                program: self.binary.clone(),
                args: vec![
                    "--print".to_string(),
                    "--output-format".to_string(),
                    "json".to_string(),
                    "-".to_string(),
                ],
                work_dir: request.work_dir,
                stdin_data: Some(stdin),
                cancel,
                temp_file: None,
            };
            acr_adapters::spawn(spawn_request).await
        })
    }
}
