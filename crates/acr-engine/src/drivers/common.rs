//! Diff resolution and placement shared by every driver whose review call
//! needs a diff: fetch it if the scheduler hasn't precomputed one, then
//! decide whether it's small enough to inline or needs a ref file.

use acr_core::ReviewConfig;
use anyhow::Result;
use std::path::PathBuf;

use super::prompts::DiffEmbed;

/// Where the diff ended up after `place_diff`: inline text, or a ref file
/// this invocation now owns (and must hand to `SpawnRequest::temp_file`).
pub enum DiffPlacement {
    Inline(String),
    RefFile(PathBuf),
}

impl DiffPlacement {
    pub fn as_embed(&self) -> DiffEmbed<'_> {
        match self {
            DiffPlacement::Inline(diff) => DiffEmbed::Inline(diff),
            DiffPlacement::RefFile(path) => DiffEmbed::RefFile(path),
        }
    }

    pub fn owned_temp_file(self) -> Option<PathBuf> {
        match self {
            DiffPlacement::Inline(_) => None,
            DiffPlacement::RefFile(path) => Some(path),
        }
    }
}

/// Returns `config.diff` if the scheduler already computed one, otherwise
/// runs the diff itself against `config.base_ref`.
pub fn resolve_diff(config: &ReviewConfig) -> Result<String> {
    match &config.diff {
        Some(diff) => Ok(diff.clone()),
        None => acr_adapters::get_diff(&config.base_ref, &config.work_dir),
    }
}

/// Writes `diff` to a ref file when it's over threshold (or `use_ref_file`
/// forces it), otherwise keeps it inline.
pub fn place_diff(config: &ReviewConfig, diff: String) -> Result<DiffPlacement> {
    if acr_adapters::should_use_ref_file(diff.len(), config.use_ref_file) {
        let path = acr_adapters::write_diff_ref_file(&config.work_dir, &diff)?;
        Ok(DiffPlacement::RefFile(path))
    } else {
        Ok(DiffPlacement::Inline(diff))
    }
}
