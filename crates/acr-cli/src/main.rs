//! Command-line entry point: parses a cohort configuration, runs the full
//! review → cluster → filter pipeline, and prints the resulting report as
//! JSON on stdout.

use std::path::PathBuf;
use std::time::Duration;

use acr_engine::{build_registries, BinaryNames, Cancellation, CohortRequest, Orchestrator};
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "acr", about = "Runs a multi-backend code review cohort over a diff")]
struct Cli {
    /// Base ref (branch, tag, or SHA) to diff the working tree against.
    #[arg(long, default_value = "main")]
    base_ref: String,

    /// Repository working directory. Defaults to the current directory.
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Comma-separated backend names to assign reviewers to, round-robin.
    /// Valid names: stdin-diff, exec-json, single-shot.
    #[arg(long, value_delimiter = ',', default_values_t = vec!["stdin-diff".to_string()])]
    backends: Vec<String>,

    /// Number of reviewer invocations to fan out.
    #[arg(long, default_value_t = 3)]
    reviewers: u32,

    /// Per-reviewer timeout in seconds.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Force ref-file mode for the diff even under the inline size threshold.
    #[arg(long, default_value_t = false)]
    force_ref_file: bool,

    /// Extra steering text appended to the default review prompt.
    #[arg(long)]
    guidance: Option<String>,

    /// Backend used for the summarize/clustering call. Defaults to the
    /// first entry in --backends.
    #[arg(long)]
    summarizer_backend: Option<String>,

    /// Backend used for the false-positive evaluation call. Defaults to the
    /// summarizer backend.
    #[arg(long)]
    fp_backend: Option<String>,

    /// Minimum fp_score (1-100) at which a clustered finding is dropped.
    #[arg(long, default_value_t = 75)]
    fp_threshold: u8,

    /// Binary invoked by the stdin-diff driver.
    #[arg(long, default_value = "review-agent-a")]
    stdin_bin: String,

    /// Binary invoked by the built-in-diff exec driver.
    #[arg(long, default_value = "review-agent-b")]
    exec_bin: String,

    /// Binary invoked by the single-shot driver.
    #[arg(long, default_value = "review-agent-c")]
    single_bin: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let work_dir = cli
        .work_dir
        .canonicalize()
        .with_context(|| format!("resolving work dir '{}'", cli.work_dir.display()))?;

    let (backends, parsers) = build_registries(BinaryNames {
        stdin_diff: cli.stdin_bin,
        exec_json: cli.exec_bin,
        single_shot: cli.single_bin,
    });

    let summarizer_backend = cli
        .summarizer_backend
        .clone()
        .or_else(|| cli.backends.first().cloned())
        .context("no backend available to act as summarizer")?;
    let fp_backend = cli.fp_backend.clone().unwrap_or_else(|| summarizer_backend.clone());

    let orchestrator = Orchestrator::new(
        &backends,
        parsers,
        &cli.backends,
        &summarizer_backend,
        &fp_backend,
        cli.fp_threshold,
    )?;

    let cancellation = Cancellation::new();
    let interrupt_cancellation = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("acr: interrupted, stopping in-flight reviewers...");
            interrupt_cancellation.fire();
        }
    });

    let request = CohortRequest {
        base_ref: cli.base_ref,
        work_dir,
        reviewer_count: cli.reviewers,
        timeout: Duration::from_secs(cli.timeout_secs),
        force_ref_file: cli.force_ref_file,
        guidance: cli.guidance,
        cancel: cancellation.receiver(),
    };

    let report = orchestrator.run(request).await?;

    if report.stats.all_failed() {
        eprintln!("acr: every reviewer failed or timed out");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
