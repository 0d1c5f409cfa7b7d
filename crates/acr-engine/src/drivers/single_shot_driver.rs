//! Driver for a backend with no subcommands at all: `<bin> -o json -` reads
//! one prompt from stdin and prints one JSON response, used identically for
//! review and summarize calls.

use acr_adapters::SpawnRequest;
use acr_core::{Backend, BoxFuture, CancellationRx, ExecutionResult, ReviewConfig, SummaryRequest};
use anyhow::Result;

use super::common::{place_diff, resolve_diff};
use super::prompts::{render_review_prompt, render_summary_stdin};

fn json_args() -> Vec<String> {
    vec!["-o".to_string(), "json".to_string(), "-".to_string()]
}

pub struct SingleShotDriver {
    binary: String,
}

impl SingleShotDriver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Backend for SingleShotDriver {
    fn name(&self) -> &'static str {
        "single-shot"
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
                args: json_args(),
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
            let stdin = render_summary_stdin(&request.prompt, &request.input);
            let spawn_request = SpawnRequest {
                program: self.binary.clone(),
                args: json_args(),
                work_dir: request.work_dir,
                stdin_data: Some(stdin),
                cancel,
                temp_file: None,
            };
            acr_adapters::spawn(spawn_request).await
        })
    }
}
