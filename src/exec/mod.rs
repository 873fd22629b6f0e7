//! Process execution behind a small trait so the gatekeeper can be driven by
//! the real OS executor in production and by in-memory fakes in tests.

pub mod system;

use std::future::Future;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::ExecError;

pub use system::SystemExecutor;

/// Raw outcome of one process run, before any policy about exit codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed or ended by a signal.
    pub exit_code: Option<i32>,
    /// True when the run was cut short by the cancellation token.
    pub killed: bool,
}

impl ExecResult {
    /// A run that exited on its own with the given code and output.
    pub fn exited(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            killed: false,
        }
    }

    /// A run that was killed after cancellation. Output is discarded.
    pub fn killed() -> Self {
        Self {
            killed: true,
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        !self.killed && self.exit_code == Some(0)
    }
}

/// Runs a single command line as one process.
///
/// Implementations must return promptly with [`ExecResult::killed`] once
/// `cancel` fires, after making sure the process is gone.
pub trait ProcessExecutor: Send + Sync {
    fn execute(
        &self,
        command_line: &str,
        cwd: &Path,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<ExecResult, ExecError>> + Send;
}
