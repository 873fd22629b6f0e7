use std::path::PathBuf;

use serde::Serialize;

/// Errors related to configuration loading and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config at {path}: {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Errors raised while building a command policy from configuration.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Allowlist entry has an empty command")]
    EmptyCommand,

    #[error("Allowlist entry `{command}` resolves to an empty command line")]
    EmptyCommandLine { command: String },

    #[error("Allowlist entry `{command}` has an unparseable command line: {message}")]
    UnparseableCommandLine { command: String, message: String },

    #[error("Disallowed pattern list contains an empty pattern")]
    EmptyPattern,

    #[error("Failed to compile disallowed patterns: {0}")]
    PatternCompile(#[from] regex::Error),
}

/// Errors raised by a [`ProcessExecutor`](crate::exec::ProcessExecutor) before
/// the process produced an exit status.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Command line is empty")]
    EmptyCommandLine,

    #[error("Failed to parse command line: {0}")]
    ParseFailed(String),

    #[error("Failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process execution failed: {0}")]
    ProcessFailed(String),
}

/// Machine-distinguishable failure kind of a gatekeeper call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CommandNotAllowed,
    UnsafePattern,
    CommandExecutionFailed,
    SpawnFailed,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CommandNotAllowed => "command_not_allowed",
            ErrorKind::UnsafePattern => "unsafe_pattern",
            ErrorKind::CommandExecutionFailed => "command_execution_failed",
            ErrorKind::SpawnFailed => "spawn_failed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced to callers of [`Gatekeeper::run`](crate::gate::Gatekeeper::run).
///
/// Messages are safe to show to a client: execution failures carry only the
/// first line of stderr.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Command not allowed: \"{command}\". Only predefined commands are permitted.")]
    CommandNotAllowed { command: String },

    #[error("Command contains disallowed characters or patterns: {reason}")]
    UnsafePattern {
        command: String,
        pattern: String,
        reason: String,
    },

    #[error("Command execution failed: {message}")]
    CommandExecutionFailed {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },

    #[error("Command could not be started: {message}")]
    SpawnFailed { command: String, message: String },

    #[error("Command `{command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("Command `{command}` was cancelled")]
    Cancelled { command: String },
}

impl GateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::CommandNotAllowed { .. } => ErrorKind::CommandNotAllowed,
            GateError::UnsafePattern { .. } => ErrorKind::UnsafePattern,
            GateError::CommandExecutionFailed { .. } => ErrorKind::CommandExecutionFailed,
            GateError::SpawnFailed { .. } => ErrorKind::SpawnFailed,
            GateError::Timeout { .. } => ErrorKind::Timeout,
            GateError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// The command text the caller submitted.
    pub fn command(&self) -> &str {
        match self {
            GateError::CommandNotAllowed { command }
            | GateError::UnsafePattern { command, .. }
            | GateError::CommandExecutionFailed { command, .. }
            | GateError::SpawnFailed { command, .. }
            | GateError::Timeout { command, .. }
            | GateError::Cancelled { command } => command,
        }
    }

    /// True for failures decided before anything was spawned.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CommandNotAllowed | ErrorKind::UnsafePattern
        )
    }
}
