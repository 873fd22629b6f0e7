#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cmdgate::error::ExecError;
use cmdgate::exec::{ExecResult, ProcessExecutor};
use cmdgate::gate::Gatekeeper;
use cmdgate::policy::CommandPolicy;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// In-memory executor that records every invocation instead of spawning.
///
/// Responses are keyed by command line; unknown command lines exit 0 with
/// `ran <command line> #<n>` on stdout, where `n` counts invocations.
#[derive(Default)]
pub struct FakeExecutor {
    responses: HashMap<String, ExecResult>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, PathBuf)>>,
    spawned: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command_line: &str, result: ExecResult) -> Self {
        self.responses.insert(command_line.to_string(), result);
        self
    }

    /// Each call takes this long unless cancelled first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessExecutor for FakeExecutor {
    async fn execute(
        &self,
        command_line: &str,
        cwd: &Path,
        cancel: CancellationToken,
    ) -> Result<ExecResult, ExecError> {
        let n = self.spawned.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls
            .lock()
            .unwrap()
            .push((command_line.to_string(), cwd.to_path_buf()));

        if let Some(delay) = self.delay {
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel.cancelled() => return Ok(ExecResult::killed()),
            }
        }

        Ok(self
            .responses
            .get(command_line)
            .cloned()
            .unwrap_or_else(|| ExecResult::exited(0, format!("ran {command_line} #{n}\n"), "")))
    }
}

/// Executor whose spawns always fail, as when the program is not installed.
pub struct MissingProgramExecutor;

impl ProcessExecutor for MissingProgramExecutor {
    async fn execute(
        &self,
        command_line: &str,
        _cwd: &Path,
        _cancel: CancellationToken,
    ) -> Result<ExecResult, ExecError> {
        Err(ExecError::SpawnFailed {
            program: command_line.split_whitespace().next().unwrap_or_default().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}

pub fn setup_workspace() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

pub fn default_gate<E: ProcessExecutor>(executor: E, ws: &TempDir) -> Gatekeeper<E> {
    let policy = CommandPolicy::with_defaults().unwrap();
    Gatekeeper::new(policy, executor, ws.path(), Duration::from_secs(5)).unwrap()
}

/// Executor whose process starts but can't be waited on.
pub struct LostProcessExecutor;

impl ProcessExecutor for LostProcessExecutor {
    async fn execute(
        &self,
        _command_line: &str,
        _cwd: &Path,
        _cancel: CancellationToken,
    ) -> Result<ExecResult, ExecError> {
        Err(ExecError::ProcessFailed(
            "process wait failed: No child processes (os error 10)".into(),
        ))
    }
}
