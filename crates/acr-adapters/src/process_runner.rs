//! Spawns a backend child process: own process group, piped stdio, a
//! background task writing stdin and another capturing capped stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use acr_core::{CancellationRx, CappedBuffer, ExecutionResult, STDERR_CAPTURE_CAP};
use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// Everything the runner needs to spawn one child.
pub struct SpawnRequest {
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
    /// Written to the child's stdin and then the pipe is shut down. `None`
    /// means the child gets a null stdin (no variant in this workspace
    /// needs that, but it keeps the runner generic).
    pub stdin_data: Option<Vec<u8>>,
    pub cancel: CancellationRx,
    /// A temp file this invocation owns (the diff ref-file, or a large
    /// summary-input file); removed when the returned `ExecutionResult`
    /// closes.
    pub temp_file: Option<PathBuf>,
}

/// Spawns `request` and returns a handle streaming its stdout.
///
/// The child is placed in its own process group via `setsid` so a later
/// cancellation can kill the whole tree, not just the immediate process.
pub async fn spawn(request: SpawnRequest) -> Result<ExecutionResult> {
    let SpawnRequest {
        program,
        args,
        work_dir,
        stdin_data,
        cancel,
        temp_file,
    } = request;

    let mut cmd = Command::new(&program);
    cmd.args(&args)
        .current_dir(&work_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .kill_on_drop(true);

    #[cfg(unix)]
    unsafe {
        // SAFETY: setsid() is async-signal-safe and runs before exec in the
        // forked child, before any other thread exists there.
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn backend '{program}'"))?;
    let pid = child.id();

    if let Some(data) = stdin_data {
        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(err) = stdin.write_all(&data).await {
                    if acr_core::debug_enabled() {
                        eprintln!("acr-adapters: stdin write failed: {err}");
                    }
                }
                let _ = stdin.shutdown().await;
            });
        }
    }

    let stdout = child.stdout.take();
    let stderr_task = child.stderr.take().map(spawn_stderr_capture);

    Ok(ExecutionResult::from_spawn(
        child, pid, stdout, stderr_task, temp_file, cancel,
    ))
}

fn spawn_stderr_capture(
    mut stderr: tokio::process::ChildStderr,
) -> tokio::task::JoinHandle<String> {
    tokio::spawn(async move {
        let mut cap = CappedBuffer::new(STDERR_CAPTURE_CAP);
        let mut chunk = [0u8; 8 * 1024];
        loop {
            match stderr.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    cap.append(&chunk[..n]);
                }
            }
        }
        cap.into_string()
    })
}

/// Checks the given binary name resolves on `PATH`.
pub fn binary_available(program: &str) -> Result<()> {
    which(program).with_context(|| format!("'{program}' not found on PATH"))?;
    Ok(())
}

fn which(program: &str) -> Result<PathBuf> {
    let path_var = std::env::var_os("PATH").context("PATH is not set")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    anyhow::bail!("not found in any PATH entry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use acr_core::Cancellation;
    use tokio::io::AsyncReadExt as _;

    #[tokio::test]
    async fn spawn_streams_stdout_and_captures_stderr() {
        let cancel = Cancellation::new().receiver();
        let request = SpawnRequest {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "echo out-line; echo err-line 1>&2".to_string(),
            ],
            work_dir: std::env::temp_dir(),
            stdin_data: None,
            cancel,
            temp_file: None,
        };

        let mut result = spawn(request).await.expect("spawn sh");
        let mut out = String::new();
        result
            .stdout()
            .read_to_string(&mut out)
            .await
            .expect("read stdout");
        result.close().await;

        assert_eq!(out.trim(), "out-line");
        assert_eq!(result.stderr().trim(), "err-line");
        assert_eq!(result.exit_code(), Some(0));
    }

    #[tokio::test]
    async fn spawn_writes_stdin_to_child() {
        let cancel = Cancellation::new().receiver();
        let request = SpawnRequest {
            program: "cat".to_string(),
            args: vec![],
            work_dir: std::env::temp_dir(),
            stdin_data: Some(b"hello from adapter\n".to_vec()),
            cancel,
            temp_file: None,
        };

        let mut result = spawn(request).await.expect("spawn cat");
        let mut out = String::new();
        result
            .stdout()
            .read_to_string(&mut out)
            .await
            .expect("read stdout");
        result.close().await;

        assert_eq!(out, "hello from adapter\n");
    }

    #[test]
    fn binary_available_fails_for_nonexistent_program() {
        assert!(binary_available("definitely-not-a-real-binary-xyz").is_err());
    }
}
