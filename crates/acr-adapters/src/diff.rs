//! Base-ref resolution and diff computation against the version-control
//! tool, plus the ref-file escalation path for oversized diffs.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::util::looks_like_hex_sha;

/// Above this many bytes, a diff (or summary input) is written to a temp
/// file and referenced by path instead of inlined into the prompt.
pub const REF_FILE_THRESHOLD_BYTES: usize = 100 * 1024;

pub struct ResolvedRef {
    pub resolved_ref: String,
    pub fetched: bool,
}

/// Resolves `ref_name` against `origin`, skipping the fetch entirely for
/// refs that are already unambiguous or dangerous to pass through a remote
/// fetch (flags, relative syntax, `HEAD`, raw SHAs, fully-qualified refs).
pub fn resolve_base_ref(ref_name: &str, work_dir: &Path) -> Result<ResolvedRef> {
    if skip_remote_fetch(ref_name) {
        return Ok(ResolvedRef {
            resolved_ref: ref_name.to_string(),
            fetched: false,
        });
    }

    let status = Command::new("git")
        .current_dir(work_dir)
        .args(["fetch", "origin", ref_name])
        .env("GIT_TERMINAL_PROMPT", "0")
        .status()
        .with_context(|| format!("failed to run git fetch for ref '{ref_name}'"))?;

    if !status.success() {
        return Ok(ResolvedRef {
            resolved_ref: ref_name.to_string(),
            fetched: false,
        });
    }

    let resolved_ref = if is_tag(ref_name, work_dir) {
        ref_name.to_string()
    } else {
        format!("origin/{ref_name}")
    };

    Ok(ResolvedRef {
        resolved_ref,
        fetched: true,
    })
}

fn skip_remote_fetch(ref_name: &str) -> bool {
    ref_name.starts_with("origin/")
        || ref_name.starts_with("refs/")
        || ref_name.starts_with('-')
        || ref_name.contains('~')
        || ref_name.contains('^')
        || ref_name == "HEAD"
        || looks_like_hex_sha(ref_name)
}

fn is_tag(ref_name: &str, work_dir: &Path) -> bool {
    Command::new("git")
        .current_dir(work_dir)
        .args([
            "rev-parse",
            "--verify",
            "--quiet",
            &format!("refs/tags/{ref_name}"),
        ])
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Computes `git diff <ref> --` against the working tree. The `--`
/// separator is required so a ref that also matches a path isn't
/// misinterpreted.
pub fn get_diff(ref_name: &str, work_dir: &Path) -> Result<String> {
    if ref_name.is_empty() {
        bail!("base ref must not be empty");
    }
    if ref_name.starts_with('-') {
        bail!("base ref must not begin with '-' (rejected to avoid flag injection)");
    }

    let output = Command::new("git")
        .current_dir(work_dir)
        .args(["diff", ref_name, "--"])
        .output()
        .with_context(|| format!("failed to run git diff against '{ref_name}'"))?;

    if !output.status.success() {
        bail!(
            "git diff against '{}' failed: {}",
            ref_name,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `force || payload_len > 100 KiB`.
pub fn should_use_ref_file(payload_len: usize, force: bool) -> bool {
    force || payload_len > REF_FILE_THRESHOLD_BYTES
}

/// Writes `contents` to `<work_dir>/.acr-diff-<uuid>.patch` at mode 0600 and
/// returns the path. The caller is responsible for deleting it (normally via
/// the owning `ExecutionResult`'s close).
pub fn write_diff_ref_file(work_dir: &Path, contents: &str) -> Result<PathBuf> {
    let path = work_dir.join(format!(".acr-diff-{}.patch", uuid::Uuid::new_v4()));
    write_private_file(&path, contents.as_bytes())?;
    Ok(path)
}

/// Writes a large summary-input payload to `<work_dir>/.acr-<suffix>-<uuid>`
/// at mode 0600.
pub fn write_summary_ref_file(work_dir: &Path, suffix: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = work_dir.join(format!(".acr-{}-{}", suffix, uuid::Uuid::new_v4()));
    write_private_file(&path, contents)?;
    Ok(path)
}

#[cfg(unix)]
fn write_private_file(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("failed to write '{}'", path.display()))
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write '{}'", path.display()))
}
