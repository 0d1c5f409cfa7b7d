//! Driver for a backend with a built-in diff-review subcommand:
//! `<bin> exec --json --color never review --base <ref>` when there's no
//! extra guidance, or `<bin> exec --json --color never -` with a
//! hand-rendered prompt on stdin when there is (the subcommand has no way to
//! carry free-form steering text). Summarize calls always use the
//! prompt-on-stdin form.

use acr_adapters::SpawnRequest;
use acr_core::{Backend, BoxFuture, CancellationRx, ExecutionResult, ReviewConfig, SummaryRequest};
use anyhow::{Context, Result};

use super::common::{place_diff, resolve_diff};
use super::prompts::{render_review_prompt, render_summary_stdin};

/// Exit code this backend's exec subcommand uses when the configured
/// credentials are rejected.
const AUTH_EXIT_CODE: i32 = 41;

fn json_color_args() -> Vec<String> {
    vec!["exec".to_string(), "--json".to_string(), "--color".to_string(), "never".to_string()]
}

pub struct ExecDriver {
    binary: String,
}

impl ExecDriver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Backend for ExecDriver {
    fn name(&self) -> &'static str {
        "exec-json"
    }

    fn available<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { acr_adapters::binary_available(&self.binary) })
    }

    fn execute_review<'a>(&'a self, config: ReviewConfig, cancel: CancellationRx) -> BoxFuture<'a, Result<ExecutionResult>> {
        Box::pin(async move {
            match &config.guidance {
                Some(guidance) if !guidance.trim().is_empty() => {
                    let diff = resolve_diff(&config).context("resolving diff for guided review")?;
                    let placement = place_diff(&config, diff)?;
                    let prompt = render_review_prompt(placement.as_embed(), Some(guidance.as_str()));
                    let mut args = json_color_args();
                    args.push("-".to_string());
                    let request = SpawnRequest {
                        program: self.binary.clone(),
                        args,
                        work_dir: config.work_dir.clone(),
                        stdin_data: Some(prompt.into_bytes()),
                        cancel,
                        temp_file: placement.owned_temp_file(),
                    };
                    acr_adapters::spawn(request).await
                }
                _ => {
                    let mut args = json_color_args();
                    args.extend(["review".to_string(), "--base".to_string(), config.base_ref.clone()]);
                    let request = SpawnRequest {
                        program: self.binary.clone(),
                        args,
                        work_dir: config.work_dir.clone(),
                        stdin_data: None,
                        cancel,
                        temp_file: None,
                    };
                    acr_adapters::spawn(request).await
                }
            }
        })
    }

    fn execute_summary<'a>(&'a self, request: SummaryRequest, cancel: CancellationRx) -> BoxFuture<'a, Result<ExecutionResult>> {
        Box::pin(async move {
            let stdin = render_summary_stdin(&request.prompt, &request.input);
            let mut args = json_color_args();
            args.push("-".to_string());
            let spawn_request = SpawnRequest {
                program: self.binary.clone(),
                args,
                work_dir: request.work_dir,
                stdin_data: Some(stdin),
                cancel,
                temp_file: None,
            };
            acr_adapters::spawn(spawn_request).await
        })
    }

    fn auth_exit_codes(&self) -> &'static [i32] {
        &[AUTH_EXIT_CODE]
    }
}
