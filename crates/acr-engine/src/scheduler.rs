//! Fans a base ref and an optional guidance string out to N reviewers,
//! round-robining them across the configured backends, and collects their
//! results with per-reviewer timeout-but-retain-partial-findings semantics.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use acr_core::{
    BackendRegistry, Cancellation, CancellationRx, ParserRegistry, ReviewConfig, ReviewStats,
    ReviewerResult,
};
use anyhow::{anyhow, bail, Context, Result};

const AUTH_STDERR_PATTERNS: &[&str] =
    &["api_key", "unauthorized", "401", "authentication required", "invalid credentials"];

pub struct CohortRequest {
    pub base_ref: String,
    pub work_dir: PathBuf,
    pub reviewer_count: u32,
    pub timeout: Duration,
    pub force_ref_file: bool,
    pub guidance: Option<String>,
    /// The caller's cancellation signal (e.g. a ctrl-c handler). Every
    /// reviewer derives its own child signal from this one, so firing it
    /// kills every in-flight reviewer's process group in addition to
    /// whatever its own per-reviewer timeout would have done.
    pub cancel: CancellationRx,
}

/// Holds the deduplicated, ordered list of backends a cohort run assigns
/// reviewers to round-robin.
pub struct CohortScheduler {
    backends: Vec<Arc<dyn acr_core::Backend>>,
    parsers: Arc<ParserRegistry>,
}

impl CohortScheduler {
    pub fn new(registry: &BackendRegistry, parsers: Arc<ParserRegistry>, backend_names: &[String]) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut backends = Vec::new();
        for name in backend_names {
            if !seen.insert(name.clone()) {
                continue;
            }
            let backend = registry
                .get(name)
                .ok_or_else(|| anyhow!("unknown backend '{name}'"))?;
            backends.push(backend);
        }
        if backends.is_empty() {
            bail!("at least one backend must be configured for a cohort run");
        }
        Ok(Self { backends, parsers })
    }

    fn backend_for_reviewer(&self, reviewer_id: u32) -> Arc<dyn acr_core::Backend> {
        let idx = ((reviewer_id - 1) as usize) % self.backends.len();
        Arc::clone(&self.backends[idx])
    }

    pub async fn run(&self, request: CohortRequest) -> Result<(Vec<ReviewerResult>, ReviewStats)> {
        for backend in &self.backends {
            backend
                .available()
                .await
                .with_context(|| format!("backend '{}' is not available", backend.name()))?;
        }

        let resolved = acr_adapters::resolve_base_ref(&request.base_ref, &request.work_dir)?;

        let needs_precomputed_diff = self.backends.iter().any(|b| b.name() != "exec-json");
        let precomputed_diff = if needs_precomputed_diff {
            Some(acr_adapters::get_diff(&resolved.resolved_ref, &request.work_dir)?)
        } else {
            None
        };

        let wall_start = Instant::now();

        let mut tasks = Vec::with_capacity(request.reviewer_count as usize);
        for reviewer_id in 1..=request.reviewer_count {
            let backend = self.backend_for_reviewer(reviewer_id);
            let parsers = Arc::clone(&self.parsers);
            let config = ReviewConfig {
                base_ref: resolved.resolved_ref.clone(),
                work_dir: request.work_dir.clone(),
                reviewer_id,
                timeout: request.timeout,
                use_ref_file: request.force_ref_file,
                diff: precomputed_diff.clone(),
                guidance: request.guidance.clone(),
            };
            let external_cancel = request.cancel.clone();
            tasks.push(tokio::spawn(run_one_reviewer(backend, parsers, config, external_cancel)));
        }

        let joined = futures::future::join_all(tasks).await;
        let mut results = Vec::with_capacity(joined.len());
        for outcome in joined {
            results.push(outcome.context("reviewer task panicked")?);
        }

        let stats = derive_stats(&results, wall_start.elapsed());
        Ok((results, stats))
    }
}

async fn run_one_reviewer(
    backend: Arc<dyn acr_core::Backend>,
    parsers: Arc<ParserRegistry>,
    config: ReviewConfig,
    mut external_cancel: CancellationRx,
) -> ReviewerResult {
    let reviewer_id = config.reviewer_id;
    let backend_name = backend.name().to_string();
    let timeout = config.timeout;
    let start = Instant::now();

    if external_cancel.is_cancelled() {
        return failed_result(
            reviewer_id,
            backend_name,
            start.elapsed(),
            "cohort cancelled before this reviewer started".to_string(),
        );
    }

    // Child signal: fires on this reviewer's own timeout, or the moment the
    // caller's cancellation (`external_cancel`) fires, whichever is first.
    let cancellation = Cancellation::new();
    let cancel_rx = cancellation.receiver();

    let mut execution = match backend.execute_review(config, cancel_rx).await {
        Ok(execution) => execution,
        Err(err) => return failed_result(reviewer_id, backend_name, start.elapsed(), err.to_string()),
    };

    let Some(stdout) = execution.take_stdout() else {
        execution.close().await;
        return failed_result(
            reviewer_id,
            backend_name,
            start.elapsed(),
            "backend produced no stdout handle".to_string(),
        );
    };

    let mut parser = match parsers.review_parser_for(&backend_name, stdout, reviewer_id) {
        Ok(parser) => parser,
        Err(err) => {
            execution.close().await;
            return failed_result(reviewer_id, backend_name, start.elapsed(), err.to_string());
        }
    };

    let deadline = tokio::time::Instant::now() + timeout;
    let mut findings = Vec::new();
    let mut timed_out = false;
    let mut fatal: Option<String> = None;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                timed_out = true;
                cancellation.fire();
                break;
            }
            _ = external_cancel.cancelled() => {
                cancellation.fire();
                break;
            }
            outcome = parser.read_finding() => {
                match outcome {
                    Ok(Some(finding)) => findings.push(finding),
                    Ok(None) => break,
                    Err(err) => {
                        fatal = Some(err.to_string());
                        break;
                    }
                }
            }
        }
    }

    execution.close().await;

    let exit_code = execution.exit_code();
    let stderr = execution.stderr().to_string();
    let auth_hint = detect_auth_failure(backend.as_ref(), exit_code, &stderr);

    let error = fatal.or_else(|| {
        if timed_out {
            Some("reviewer timed out".to_string())
        } else if exit_code.map(|code| code != 0).unwrap_or(false) {
            Some(format!("backend exited with code {}", exit_code.unwrap_or(-1)))
        } else {
            None
        }
    });

    ReviewerResult {
        reviewer_id,
        backend_name,
        findings,
        exit_code,
        parse_errors: parser.parse_errors(),
        timed_out,
        duration: start.elapsed(),
        error,
        auth_hint,
    }
}

fn failed_result(reviewer_id: u32, backend_name: String, duration: Duration, error: String) -> ReviewerResult {
    if acr_core::debug_enabled() {
        eprintln!("acr-engine: reviewer {reviewer_id} ({backend_name}) failed: {error}");
    }
    ReviewerResult {
        reviewer_id,
        backend_name,
        findings: Vec::new(),
        exit_code: None,
        parse_errors: 0,
        timed_out: false,
        duration,
        error: Some(error),
        auth_hint: None,
    }
}

fn detect_auth_failure(backend: &dyn acr_core::Backend, exit_code: Option<i32>, stderr: &str) -> Option<String> {
    let lower = stderr.to_lowercase();
    let code_matches = exit_code
        .map(|code| backend.auth_exit_codes().contains(&code))
        .unwrap_or(false);
    let pattern_matches = AUTH_STDERR_PATTERNS.iter().any(|pattern| lower.contains(pattern));
    if code_matches || pattern_matches {
        let hint = format!("authentication failure detected for backend '{}'", backend.name());
        if acr_core::debug_enabled() {
            eprintln!("acr-engine: {hint}");
        }
        Some(hint)
    } else {
        None
    }
}

fn derive_stats(results: &[ReviewerResult], wall_clock: Duration) -> ReviewStats {
    let mut stats = ReviewStats {
        total_reviewers: results.len(),
        wall_clock,
        ..Default::default()
    };
    for result in results {
        if result.failed() {
            stats.failed += 1;
        }
        if result.timed_out {
            stats.timed_out += 1;
        }
        stats.per_reviewer_duration.insert(result.reviewer_id, result.duration);
        *stats.backend_counts.entry(result.backend_name.clone()).or_insert(0) += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::PlainTextReviewParser;
    use acr_core::{BoxFuture, CancellationRx, ExecutionResult, ReviewParser, SummaryRequest};

    /// A fake backend that runs a shell script instead of a real CLI, the
    /// same way the diff provider's tests shell out to git in a tempdir.
    struct ShellBackend {
        name: &'static str,
        script: &'static str,
    }

    impl acr_core::Backend for ShellBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn available<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
            Box::pin(async { Ok(()) })
        }

        fn execute_review<'a>(
            &'a self,
            config: ReviewConfig,
            cancel: CancellationRx,
        ) -> BoxFuture<'a, Result<ExecutionResult>> {
            Box::pin(async move {
                acr_adapters::spawn(acr_adapters::SpawnRequest {
                    program: "sh".to_string(),
                    args: vec!["-c".to_string(), self.script.to_string()],
                    work_dir: config.work_dir,
                    stdin_data: None,
                    cancel,
                    temp_file: None,
                })
                .await
            })
        }

        fn execute_summary<'a>(
            &'a self,
            _request: SummaryRequest,
            _cancel: CancellationRx,
        ) -> BoxFuture<'a, Result<ExecutionResult>> {
            Box::pin(async { anyhow::bail!("not used in these tests") })
        }
    }

    fn registries() -> (BackendRegistry, Arc<ParserRegistry>) {
        let mut backends = BackendRegistry::new();
        backends.register(Arc::new(ShellBackend {
            name: "fake-fast",
            script: "echo quick finding",
        }));
        backends.register(Arc::new(ShellBackend {
            name: "fake-slow",
            script: "echo first finding; sleep 5; echo too-late",
        }));

        let mut parsers = ParserRegistry::new();
        parsers.register_review("fake-fast", |stdout, reviewer_id| {
            Box::new(PlainTextReviewParser::new(stdout, reviewer_id)) as Box<dyn ReviewParser>
        });
        parsers.register_review("fake-slow", |stdout, reviewer_id| {
            Box::new(PlainTextReviewParser::new(stdout, reviewer_id)) as Box<dyn ReviewParser>
        });
        (backends, Arc::new(parsers))
    }

    #[tokio::test]
    async fn timed_out_reviewer_keeps_findings_collected_before_the_deadline() {
        let (backends, parsers) = registries();
        let scheduler =
            CohortScheduler::new(&backends, parsers, &["fake-fast".to_string(), "fake-slow".to_string()]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::process::Command::new("git")
            .args(["init", "-q"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        std::process::Command::new("git")
            .args(["config", "user.email", "t@example.com"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        std::process::Command::new("git")
            .args(["config", "user.name", "t"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        std::process::Command::new("git")
            .args(["add", "."])
            .current_dir(dir.path())
            .status()
            .unwrap();
        std::process::Command::new("git")
            .args(["commit", "-q", "-m", "init"])
            .current_dir(dir.path())
            .status()
            .unwrap();

        let (results, stats) = scheduler
            .run(CohortRequest {
                base_ref: "HEAD".to_string(),
                work_dir: dir.path().to_path_buf(),
                reviewer_count: 2,
                timeout: Duration::from_millis(300),
                force_ref_file: false,
                guidance: None,
                cancel: Cancellation::new().receiver(),
            })
            .await
            .unwrap();

        let fast = results.iter().find(|r| r.reviewer_id == 1).unwrap();
        assert!(!fast.timed_out);
        assert_eq!(fast.findings.len(), 1);
        assert_eq!(fast.findings[0].text, "quick finding");

        let slow = results.iter().find(|r| r.reviewer_id == 2).unwrap();
        assert!(slow.timed_out);
        assert_eq!(slow.findings.len(), 1);
        assert_eq!(slow.findings[0].text, "first finding");
        assert!(!slow.failed());

        assert_eq!(stats.timed_out, 1);
        assert!(!stats.all_failed());
    }

    #[tokio::test]
    async fn external_cancellation_stops_an_in_flight_reviewer_and_keeps_partial_findings() {
        let (backends, parsers) = registries();
        let scheduler = CohortScheduler::new(&backends, parsers, &["fake-slow".to_string()]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        for args in [
            vec!["init", "-q"],
            vec!["config", "user.email", "t@example.com"],
            vec!["config", "user.name", "t"],
        ] {
            std::process::Command::new("git").args(&args).current_dir(dir.path()).status().unwrap();
        }
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        std::process::Command::new("git").args(["add", "."]).current_dir(dir.path()).status().unwrap();
        std::process::Command::new("git")
            .args(["commit", "-q", "-m", "init"])
            .current_dir(dir.path())
            .status()
            .unwrap();

        let cohort_cancel = Cancellation::new();
        let request = CohortRequest {
            base_ref: "HEAD".to_string(),
            work_dir: dir.path().to_path_buf(),
            reviewer_count: 1,
            // Long enough that only the external signal, not the timeout, can
            // plausibly be what stops this reviewer before the test ends.
            timeout: Duration::from_secs(30),
            force_ref_file: false,
            guidance: None,
            cancel: cohort_cancel.receiver(),
        };

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cohort_cancel.fire();
        });

        let (results, _stats) = tokio::time::timeout(Duration::from_secs(5), scheduler.run(request))
            .await
            .expect("external cancellation should have ended the run well before the 30s timeout")
            .unwrap();

        let reviewer = &results[0];
        assert!(!reviewer.timed_out, "stopped by cancellation, not its own timeout");
        assert_eq!(reviewer.findings.len(), 1);
        assert_eq!(reviewer.findings[0].text, "first finding");
    }

    #[tokio::test]
    async fn round_robin_assigns_backends_in_order() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(ShellBackend { name: "a", script: "true" }));
        registry.register(Arc::new(ShellBackend { name: "b", script: "true" }));
        let parsers = Arc::new(ParserRegistry::new());
        let scheduler =
            CohortScheduler::new(&registry, parsers, &["a".to_string(), "b".to_string()]).unwrap();

        assert_eq!(scheduler.backend_for_reviewer(1).name(), "a");
        assert_eq!(scheduler.backend_for_reviewer(2).name(), "b");
        assert_eq!(scheduler.backend_for_reviewer(3).name(), "a");
    }

    #[test]
    fn unknown_backend_name_is_rejected() {
        let registry = BackendRegistry::new();
        let parsers = Arc::new(ParserRegistry::new());
        assert!(CohortScheduler::new(&registry, parsers, &["missing".to_string()]).is_err());
    }

    #[test]
    fn empty_backend_list_is_rejected() {
        let registry = BackendRegistry::new();
        let parsers = Arc::new(ParserRegistry::new());
        assert!(CohortScheduler::new(&registry, parsers, &[]).is_err());
    }

    #[test]
    fn all_failed_reflects_failures_and_timeouts_together() {
        let results = vec![
            failed_result(1, "a".to_string(), Duration::from_secs(1), "boom".to_string()),
            ReviewerResult {
                reviewer_id: 2,
                backend_name: "a".to_string(),
                findings: vec![],
                exit_code: None,
                parse_errors: 0,
                timed_out: true,
                duration: Duration::from_secs(1),
                error: Some("reviewer timed out".to_string()),
                auth_hint: None,
            },
        ];
        let stats = derive_stats(&results, Duration::from_secs(1));
        assert!(stats.all_failed());
    }
}
