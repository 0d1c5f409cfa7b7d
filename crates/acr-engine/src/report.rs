//! The orchestrator's terminal output: every reviewer's raw result, the
//! clustered findings, and how each aggregated finding was ultimately
//! disposed of.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use acr_core::{
    aggregate, build_dispositions, Cancellation, Disposition, GroupedFindings, ParserRegistry,
    ReviewStats, ReviewerResult,
};
use anyhow::{anyhow, Result};

use crate::fp_filter::FpFilter;
use crate::scheduler::{CohortRequest, CohortScheduler};
use crate::summarizer::Summarizer;

#[derive(serde::Serialize)]
pub struct PipelineReport {
    pub reviewer_results: Vec<ReviewerResult>,
    pub stats: ReviewStats,
    pub grouped: GroupedFindings,
    pub dispositions: HashMap<usize, Disposition>,
}

/// Ties the cohort scheduler, summarizer, and FP filter together behind one
/// call: fan out reviewers, cluster their findings, filter false positives,
/// and map every aggregated index to its final disposition.
pub struct Orchestrator {
    scheduler: CohortScheduler,
    summarizer: Summarizer,
    fp_filter: FpFilter,
}

impl Orchestrator {
    pub fn new(
        backends: &acr_core::BackendRegistry,
        parsers: Arc<ParserRegistry>,
        cohort_backend_names: &[String],
        summarizer_backend_name: &str,
        fp_filter_backend_name: &str,
        fp_threshold: u8,
    ) -> Result<Self> {
        let scheduler = CohortScheduler::new(backends, Arc::clone(&parsers), cohort_backend_names)?;

        let summarizer_backend = backends
            .get(summarizer_backend_name)
            .ok_or_else(|| anyhow!("unknown summarizer backend '{summarizer_backend_name}'"))?;
        let summarizer_parser = parsers.summary_parser_for(summarizer_backend_name)?;
        let summarizer = Summarizer::new(summarizer_backend, summarizer_parser);

        let fp_backend = backends
            .get(fp_filter_backend_name)
            .ok_or_else(|| anyhow!("unknown FP filter backend '{fp_filter_backend_name}'"))?;
        let fp_parser = parsers.summary_parser_for(fp_filter_backend_name)?;
        let fp_filter = FpFilter::new(fp_backend, fp_parser, fp_threshold);

        Ok(Self { scheduler, summarizer, fp_filter })
    }

    pub async fn run(&self, request: CohortRequest) -> Result<PipelineReport> {
        let work_dir = request.work_dir.clone();
        // The same signal that can stop an in-flight reviewer also reaches
        // the summarizer and FP-filter stages that run after the fan-out
        // joins, so an interrupt mid-pipeline cancels whichever is current.
        let cancel = request.cancel.clone();
        let (reviewer_results, mut stats) = self.scheduler.run(request).await?;

        let all_findings: Vec<acr_core::Finding> =
            reviewer_results.iter().flat_map(|r| r.findings.clone()).collect();
        let aggregated = aggregate(&all_findings);

        let summarize_outcome = self
            .summarizer
            .summarize(&aggregated, work_dir.clone(), cancel.clone())
            .await;
        stats.summarizer_duration = Some(summarize_outcome.duration);

        let fp_outcome = self.fp_filter.apply(summarize_outcome.grouped, work_dir, cancel).await;
        stats.fp_filter_duration = Some(fp_outcome.duration);
        stats.fp_removed_count = fp_outcome.removed.len();

        let survivors: Vec<(usize, String)> = fp_outcome
            .grouped
            .findings
            .iter()
            .flat_map(|group| group.sources.iter().map(|&source| (source, group.title.clone())))
            .collect();

        let dispositions = build_dispositions(
            aggregated.len(),
            &fp_outcome.grouped.info,
            &fp_outcome.removed,
            &[],
            &survivors,
        );

        Ok(PipelineReport {
            reviewer_results,
            stats,
            grouped: fp_outcome.grouped,
            dispositions,
        })
    }
}
