//! Append-only JSONL record of rejected commands.
//!
//! Uses synchronous `std::fs`: each entry is a single small `O_APPEND` write,
//! which keeps concurrent writers from interleaving within a line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::error::{ErrorKind, GateError};

/// One line of the security log.
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: String,
    kind: ErrorKind,
    reason: String,
    command: &'a str,
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a rejection. Failures to write are logged and otherwise ignored
    /// so auditing never changes the outcome of a call.
    pub fn record(&self, error: &GateError) {
        let entry = AuditEntry {
            timestamp: Utc::now().to_rfc3339(),
            kind: error.kind(),
            reason: error.to_string(),
            command: error.command(),
        };

        let mut line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize security log entry: {}", e);
                return;
            }
        };
        line.push('\n');

        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(line.as_bytes()) {
                    tracing::warn!(
                        "Failed to write to security log at {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to open security log at {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}
