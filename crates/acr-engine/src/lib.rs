//! Backend drivers, their parsers, the cohort scheduler, the summarizer, and
//! the false-positive filter: everything that turns a base ref and a set of
//! configured backends into a final, disposition-tagged set of findings.

pub mod drivers;
pub mod fp_filter;
pub mod parsers;
pub mod registries;
pub mod report;
pub mod scheduler;
pub mod summarizer;

pub use acr_core::Cancellation;
pub use fp_filter::{FpFilter, FpFilterOutcome};
pub use registries::{build_registries, BinaryNames};
pub use report::{Orchestrator, PipelineReport};
pub use scheduler::{CohortRequest, CohortScheduler};
pub use summarizer::{SummarizeOutcome, Summarizer};
