//! Lifecycle handle for one spawned child process.

use std::path::PathBuf;

use crate::cancel::CancellationRx;

/// Byte cap applied to captured stderr. Overflow is silently discarded; the
/// cap exists so a chatty or hung backend can't exhaust memory via stderr.
pub const STDERR_CAPTURE_CAP: usize = 64 * 1024;

/// A byte sink with a fixed capacity that reports every byte as accepted
/// even once it starts discarding, so a caller copying into it via a
/// `Read`/`Write`-style loop never sees a short write and mistakes capping
/// for an I/O failure.
#[derive(Debug, Default)]
pub struct CappedBuffer {
    cap: usize,
    buf: Vec<u8>,
    truncated: bool,
}

impl CappedBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            buf: Vec::new(),
            truncated: false,
        }
    }

    /// Appends as much of `data` as still fits under the cap. Always
    /// returns `data.len()`.
    pub fn append(&mut self, data: &[u8]) -> usize {
        let remaining = self.cap.saturating_sub(self.buf.len());
        let take = remaining.min(data.len());
        if take > 0 {
            self.buf.extend_from_slice(&data[..take]);
        }
        if take < data.len() {
            self.truncated = true;
        }
        data.len()
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_string(self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

/// Exit status of a closed `ExecutionResult`: the child's real code on a
/// natural exit, or -1 if the wait itself failed.
pub type ExitCode = i32;

/// Lifecycle handle returned by a backend driver's review/summary call.
///
/// Owns the child's stdout (taken by the caller's parser as it streams
/// findings) and, on `close()`, reaps the child -- killing its entire
/// process group first if the run was cancelled -- and deletes any temp
/// file it was responsible for.
pub struct ExecutionResult {
    stdout: Option<tokio::process::ChildStdout>,
    child: Option<tokio::process::Child>,
    pid: Option<u32>,
    stderr_task: Option<tokio::task::JoinHandle<String>>,
    temp_file: Option<PathBuf>,
    cancel: CancellationRx,
    closed: bool,
    exit_code: Option<ExitCode>,
    stderr: Option<String>,
}

impl ExecutionResult {
    /// Assembled by the process runner (`acr-adapters`) right after spawn.
    #[allow(clippy::too_many_arguments)]
    pub fn from_spawn(
        child: tokio::process::Child,
        pid: Option<u32>,
        stdout: Option<tokio::process::ChildStdout>,
        stderr_task: Option<tokio::task::JoinHandle<String>>,
        temp_file: Option<PathBuf>,
        cancel: CancellationRx,
    ) -> Self {
        Self {
            stdout,
            child: Some(child),
            pid,
            stderr_task,
            temp_file,
            cancel,
            closed: false,
            exit_code: None,
            stderr: None,
        }
    }

    /// Mutable access to the child's stdout for a parser to read
    /// incrementally. Panics if called after `close()` or twice without an
    /// intervening `take_stdout`.
    pub fn stdout(&mut self) -> &mut tokio::process::ChildStdout {
        self.stdout
            .as_mut()
            .expect("stdout already taken or result already closed")
    }

    /// Takes ownership of stdout, e.g. to move it into a parser task.
    pub fn take_stdout(&mut self) -> Option<tokio::process::ChildStdout> {
        self.stdout.take()
    }

    /// Idempotent; safe to call any number of times. Closes
    /// the stdout reader, kills the process group if cancellation fired,
    /// waits for the child, records its exit code, joins the stderr
    /// capture task, and removes any owned temp file.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stdout = None;

        if self.cancel.is_cancelled() {
            self.kill_process_group();
        }

        if let Some(mut child) = self.child.take() {
            let code = match child.wait().await {
                Ok(status) => status.code().unwrap_or(-1),
                Err(_) => -1,
            };
            self.exit_code = Some(code);
        }

        if let Some(task) = self.stderr_task.take() {
            self.stderr = Some(task.await.unwrap_or_default());
        }

        if let Some(path) = self.temp_file.take() {
            let _ = tokio::fs::remove_file(&path).await;
        }
    }

    /// Well-defined only after the first `close()` call returns.
    pub fn exit_code(&self) -> Option<ExitCode> {
        self.exit_code
    }

    /// Well-defined only after the first `close()` call returns.
    pub fn stderr(&self) -> &str {
        self.stderr.as_deref().unwrap_or("")
    }

    fn kill_process_group(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.pid {
                // SAFETY: kill() is async-signal-safe; a negative pid targets
                // the whole process group, which the child was placed into
                // at spawn time via setsid().
                unsafe {
                    libc::kill(-(pid as i32), libc::SIGKILL);
                }
                return;
            }
        }
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capped_buffer_reports_full_length_even_when_discarding() {
        let mut buf = CappedBuffer::new(4);
        assert_eq!(buf.append(b"hello world"), 11);
        assert!(buf.truncated());
        assert_eq!(buf.into_string(), "hell");
    }

    #[test]
    fn capped_buffer_under_cap_is_not_truncated() {
        let mut buf = CappedBuffer::new(100);
        assert_eq!(buf.append(b"short"), 5);
        assert!(!buf.truncated());
        assert_eq!(buf.into_string(), "short");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn close_is_idempotent_and_exit_code_is_stable() {
        let mut cmd = tokio::process::Command::new("true");
        cmd.stdout(std::process::Stdio::null());
        let child = cmd.spawn().expect("spawn true");
        let cancel = crate::cancel::Cancellation::new().receiver();
        let mut result = ExecutionResult::from_spawn(child, None, None, None, None, cancel);

        result.close().await;
        let first = result.exit_code();
        result.close().await;
        assert_eq!(result.exit_code(), first);
    }
}
