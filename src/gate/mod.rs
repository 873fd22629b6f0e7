pub mod audit;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use audit::AuditLog;

use crate::config::AppConfig;
use crate::error::{ExecError, GateError};
use crate::exec::{ExecResult, ProcessExecutor, SystemExecutor};
use crate::policy::{normalize, CommandPolicy};

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
}

/// Validates submitted commands against a [`CommandPolicy`] and runs the
/// allowed ones through a [`ProcessExecutor`].
///
/// This is the single entry point for command execution. Each call is
/// independent: the gatekeeper holds only immutable configuration, so one
/// instance can serve concurrent callers behind an `Arc`.
pub struct Gatekeeper<E = SystemExecutor> {
    policy: CommandPolicy,
    executor: E,
    working_dir: PathBuf,
    timeout: Duration,
    limiter: Option<Semaphore>,
    audit: Option<AuditLog>,
}

impl Gatekeeper<SystemExecutor> {
    /// Build a gatekeeper backed by real processes from the resolved
    /// application configuration.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let policy = CommandPolicy::from_config(config)
            .map_err(|e| anyhow::anyhow!("Failed to build command policy: {}", e))?;

        let mut gatekeeper = Gatekeeper::new(
            policy,
            SystemExecutor,
            &config.working_dir,
            Duration::from_secs(config.timeout_secs),
        )
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to resolve working directory {}: {}",
                config.working_dir.display(),
                e
            )
        })?;

        if let Some(max) = config.max_concurrent {
            gatekeeper = gatekeeper.with_max_concurrent(max);
        }
        if let Some(path) = &config.security_log_path {
            gatekeeper = gatekeeper.with_audit_log(AuditLog::new(path));
        }
        Ok(gatekeeper)
    }
}

impl<E: ProcessExecutor> Gatekeeper<E> {
    /// Create a gatekeeper rooted at `working_dir`.
    ///
    /// The directory must exist; it is resolved to its canonical path once
    /// here and never derived from caller input afterwards.
    pub fn new(
        policy: CommandPolicy,
        executor: E,
        working_dir: &Path,
        timeout: Duration,
    ) -> std::io::Result<Self> {
        let working_dir = std::fs::canonicalize(working_dir)?;
        if !working_dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("{} is not a directory", working_dir.display()),
            ));
        }

        let violations = policy.self_test();
        for v in &violations {
            tracing::warn!(
                command = %v.command,
                pattern = %v.pattern,
                "Allowlist entry contains a disallowed pattern and will always be rejected"
            );
        }

        Ok(Self {
            policy,
            executor,
            working_dir,
            timeout,
            limiter: None,
            audit: None,
        })
    }

    /// Bound the number of commands running at once. Extra callers wait.
    /// The limit is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        let permits = max.clamp(1, Semaphore::MAX_PERMITS);
        if permits != max {
            tracing::warn!(requested = max, permits, "max_concurrent out of range, clamped");
        }
        self.limiter = Some(Semaphore::new(permits));
        self
    }

    /// Record rejections to a JSONL security log.
    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn policy(&self) -> &CommandPolicy {
        &self.policy
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate and execute a command.
    pub async fn run(&self, command: &str) -> Result<CommandResult, GateError> {
        self.run_with_cancel(command, CancellationToken::new()).await
    }

    /// Validate and execute a command, killing it if `cancel` fires.
    ///
    /// 1. The command must be an allowlist key and free of disallowed
    ///    patterns, otherwise nothing is spawned.
    /// 2. The resolved command line runs in the working directory, bounded
    ///    by the timeout.
    /// 3. A non-zero exit becomes [`GateError::CommandExecutionFailed`]
    ///    carrying only the first line of stderr.
    pub async fn run_with_cancel(
        &self,
        command: &str,
        cancel: CancellationToken,
    ) -> Result<CommandResult, GateError> {
        tracing::info!(command = %command, "Received command request");

        let command_line = match self.policy.authorize(command) {
            Ok(line) => line,
            Err(e) => {
                self.record_rejection(&e);
                return Err(e);
            }
        };
        let key = normalize(command);

        let _permit = match &self.limiter {
            Some(limiter) => tokio::select! {
                permit = limiter.acquire() => permit.ok(),
                () = cancel.cancelled() => return Err(cancelled(key)),
            },
            None => None,
        };

        if cancel.is_cancelled() {
            return Err(cancelled(key));
        }

        tracing::info!(command = %key, command_line = %command_line, "Executing allowed command");
        let started = Instant::now();
        let (result, timed_out) = self.execute_bounded(command_line, cancel).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let output = match result {
            Ok(output) => output,
            Err(ExecError::ProcessFailed(message)) => {
                tracing::error!(command = %key, elapsed_ms, "Command failed after it was started: {}", message);
                return Err(GateError::CommandExecutionFailed {
                    command: key.to_string(),
                    exit_code: None,
                    message,
                });
            }
            Err(e) => {
                tracing::error!(command = %key, "Command could not be started: {}", e);
                return Err(GateError::SpawnFailed {
                    command: key.to_string(),
                    message: e.to_string(),
                });
            }
        };

        if output.killed {
            if timed_out {
                tracing::warn!(
                    command = %key,
                    timeout_secs = self.timeout.as_secs(),
                    "Command timed out and was killed"
                );
                return Err(GateError::Timeout {
                    command: key.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            tracing::info!(command = %key, elapsed_ms, "Command cancelled");
            return Err(cancelled(key));
        }

        if !output.success() {
            tracing::error!(
                command = %key,
                exit_code = ?output.exit_code,
                elapsed_ms,
                "Command execution failed"
            );
            tracing::info!(command = %key, stdout = %output.stdout, stderr = %output.stderr, "Failed command output");
            return Err(GateError::CommandExecutionFailed {
                command: key.to_string(),
                exit_code: output.exit_code,
                message: failure_message(&output),
            });
        }

        tracing::info!(command = %key, elapsed_ms, "Command succeeded");
        tracing::debug!(command = %key, stdout = %output.stdout, stderr = %output.stderr, "Command output");

        Ok(CommandResult {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run through the executor; on timeout, cancel and wait for the kill.
    async fn execute_bounded(
        &self,
        command_line: &str,
        cancel: CancellationToken,
    ) -> (Result<ExecResult, ExecError>, bool) {
        let token = cancel.child_token();
        let execution = self
            .executor
            .execute(command_line, &self.working_dir, token.clone());
        tokio::pin!(execution);

        tokio::select! {
            result = &mut execution => (result, false),
            () = tokio::time::sleep(self.timeout) => {
                token.cancel();
                (execution.await, true)
            }
        }
    }

    fn record_rejection(&self, error: &GateError) {
        match error {
            GateError::UnsafePattern {
                command,
                pattern,
                reason,
            } => {
                tracing::warn!(command = %command, pattern = %pattern, reason = %reason, "Security event: command contains disallowed pattern");
            }
            other => {
                tracing::warn!(command = %other.command(), "Command not allowed");
            }
        }
        if let Some(audit) = &self.audit {
            audit.record(error);
        }
    }
}

fn cancelled(command: &str) -> GateError {
    GateError::Cancelled {
        command: command.to_string(),
    }
}

/// First non-empty line of stderr, or a description of the exit status.
fn failure_message(output: &ExecResult) -> String {
    if let Some(line) = output.stderr.lines().map(str::trim).find(|l| !l.is_empty()) {
        return line.to_string();
    }
    match output.exit_code {
        Some(code) => format!("process exited with code {code}"),
        None => "process terminated by signal".to_string(),
    }
}
