//! OS-facing adapters: process spawning (placing children in their own
//! process group, capping stderr, writing stdin) and version-control diff
//! resolution. Everything here produces or consumes `acr_core::ExecutionResult`.

pub mod diff;
pub mod process_runner;
mod util;

pub use diff::{
    get_diff, resolve_base_ref, should_use_ref_file, write_diff_ref_file, write_summary_ref_file,
    ResolvedRef, REF_FILE_THRESHOLD_BYTES,
};
pub use process_runner::{binary_available, spawn, SpawnRequest};
