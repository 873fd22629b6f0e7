//! OS-backed executor.
//!
//! The command line is split into argv with shell quoting rules and the
//! program is spawned directly. No shell is involved, so `&&`, `|`, `>` and
//! `$(..)` reach the program as plain arguments instead of being interpreted.
//!
//! The child runs in its own process group (`process_group(0)`) so that a
//! cancellation kills everything it started, not just the direct child.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{ExecResult, ProcessExecutor};
use crate::error::ExecError;

/// Spawns real processes with [`tokio::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl ProcessExecutor for SystemExecutor {
    async fn execute(
        &self,
        command_line: &str,
        cwd: &Path,
        cancel: CancellationToken,
    ) -> Result<ExecResult, ExecError> {
        let argv = shell_words::split(command_line)
            .map_err(|e| ExecError::ParseFailed(e.to_string()))?;
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommandLine)?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        let pid = child.id();
        tracing::debug!(program = %program, pid = ?pid, cwd = %cwd.display(), "Spawned process");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecError::ProcessFailed("Failed to capture stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExecError::ProcessFailed("Failed to capture stderr".into()))?;

        // Drain both pipes concurrently so a chatty process can't block on a
        // full pipe while we wait for it to exit.
        let stdout_reader = tokio::spawn(read_lossy(stdout));
        let stderr_reader = tokio::spawn(read_lossy(stderr));
        let readers = [stdout_reader.abort_handle(), stderr_reader.abort_handle()];

        let finished = tokio::select! {
            finished = async {
                let status = child.wait().await;
                let (out, err) = tokio::join!(collect(stdout_reader), collect(stderr_reader));
                (status, out, err)
            } => Some(finished),
            () = cancel.cancelled() => None,
        };

        match finished {
            Some((status, stdout, stderr)) => {
                let status = status
                    .map_err(|e| ExecError::ProcessFailed(format!("process wait failed: {e}")))?;
                Ok(ExecResult {
                    stdout,
                    stderr,
                    exit_code: status.code(),
                    killed: false,
                })
            }
            None => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                for reader in readers {
                    reader.abort();
                }
                // Reap the child to prevent zombies.
                if let Err(e) = child.wait().await {
                    tracing::warn!(pid = ?pid, "Failed to reap killed process: {}", e);
                }
                Ok(ExecResult::killed())
            }
        }
    }
}

/// Read a pipe to EOF, decoding as UTF-8 with replacement characters.
async fn read_lossy<R: AsyncRead + Unpin>(mut pipe: R) -> String {
    let mut buf = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut buf).await {
        tracing::warn!("Failed to read process output: {}", e);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn collect(reader: JoinHandle<String>) -> String {
    match reader.await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Output reader task failed: {}", e);
            String::new()
        }
    }
}

/// SIGKILL the whole process group led by `pid`.
fn kill_process_group(pid: u32) {
    let pgid = nix::unistd::Pid::from_raw(pid as i32);
    match nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pid, "Failed to kill process group: {}", e),
    }
}
