//! Evaluates clustered findings for false-positive likelihood via a single
//! summarize-style call, then removes the clusters that score at or above a
//! threshold. Fails open: any spawn, I/O, or decode error leaves the input
//! untouched and marks the run as skipped rather than losing findings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use acr_core::{Backend, CancellationRx, FindingGroup, FpVerdict, GroupedFindings, SummaryParser, SummaryRequest};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use crate::drivers::FP_FILTER_PROMPT;

const DEFAULT_THRESHOLD: u8 = 75;

pub struct FpFilter {
    backend: Arc<dyn Backend>,
    parser: Box<dyn SummaryParser>,
    threshold: u8,
}

pub struct FpFilterOutcome {
    pub grouped: GroupedFindings,
    pub removed: Vec<FpVerdict>,
    pub duration: Duration,
    pub eval_errors: u32,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

impl FpFilter {
    pub fn new(backend: Arc<dyn Backend>, parser: Box<dyn SummaryParser>, threshold: u8) -> Self {
        let threshold = if (1..=100).contains(&threshold) { threshold } else { DEFAULT_THRESHOLD };
        Self { backend, parser, threshold }
    }

    pub async fn apply(&self, grouped: GroupedFindings, work_dir: PathBuf, cancel: CancellationRx) -> FpFilterOutcome {
        let start = Instant::now();

        if grouped.findings.is_empty() || cancel.is_cancelled() {
            return FpFilterOutcome {
                grouped,
                removed: Vec::new(),
                duration: start.elapsed(),
                eval_errors: 0,
                skipped: false,
                skip_reason: None,
            };
        }

        match self.try_apply(&grouped.findings, work_dir, cancel).await {
            Ok((kept, removed, eval_errors)) => FpFilterOutcome {
                grouped: GroupedFindings { findings: kept, info: grouped.info },
                removed,
                duration: start.elapsed(),
                eval_errors,
                skipped: false,
                skip_reason: None,
            },
            Err(err) => {
                let reason = format!("{err:#}");
                if acr_core::debug_enabled() {
                    eprintln!("acr-engine: fp filter skipped, input passed through unfiltered: {reason}");
                }
                FpFilterOutcome {
                    grouped,
                    removed: Vec::new(),
                    duration: start.elapsed(),
                    eval_errors: 0,
                    skipped: true,
                    skip_reason: Some(reason),
                }
            }
        }
    }

    async fn try_apply(
        &self,
        findings: &[FindingGroup],
        work_dir: PathBuf,
        cancel: CancellationRx,
    ) -> Result<(Vec<FindingGroup>, Vec<FpVerdict>, u32)> {
        let input = build_input(findings)?;
        let request = SummaryRequest {
            prompt: FP_FILTER_PROMPT.to_string(),
            input,
            work_dir,
        };

        let mut execution = self.backend.execute_summary(request, cancel).await?;
        let mut buf = Vec::new();
        let read_result = execution.stdout().read_to_end(&mut buf).await;
        execution.close().await;
        read_result.context("reading FP filter output")?;

        let text = self.parser.extract_text(&buf)?;
        let verdicts: Verdicts = serde_json::from_str(&text).context("decoding FP filter verdicts")?;

        let by_id: HashMap<usize, Evaluation> = verdicts.evaluations.into_iter().map(|e| (e.id, e)).collect();

        let mut kept = Vec::with_capacity(findings.len());
        let mut removed = Vec::new();
        let mut eval_errors = 0u32;

        for (id, group) in findings.iter().enumerate() {
            match by_id.get(&id) {
                Some(Evaluation { fp_score: Some(score), reasoning, .. }) if *score >= self.threshold => {
                    removed.push(FpVerdict {
                        source: id,
                        fp_score: Some(*score),
                        reasoning: reasoning.clone(),
                    });
                }
                Some(_) => kept.push(group.clone()),
                None => {
                    eval_errors += 1;
                    kept.push(group.clone());
                }
            }
        }

        Ok((kept, removed, eval_errors))
    }
}

#[derive(Serialize)]
struct InputItem<'a> {
    id: usize,
    title: &'a str,
    summary: &'a str,
    messages: &'a [String],
    reviewer_count: u32,
}

fn build_input(findings: &[FindingGroup]) -> Result<Vec<u8>> {
    let items: Vec<InputItem> = findings
        .iter()
        .enumerate()
        .map(|(id, group)| InputItem {
            id,
            title: &group.title,
            summary: &group.summary,
            messages: &group.messages,
            reviewer_count: group.reviewer_count,
        })
        .collect();
    serde_json::to_vec(&items).context("marshalling grouped findings for the FP filter")
}

#[derive(Deserialize)]
struct Verdicts {
    evaluations: Vec<Evaluation>,
}

#[derive(Deserialize)]
struct Evaluation {
    id: usize,
    fp_score: Option<u8>,
    reasoning: Option<String>,
}
