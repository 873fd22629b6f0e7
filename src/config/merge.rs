use super::schema::{AppConfig, PartialConfig};
use crate::policy::defaults::{default_allowlist, default_disallowed_patterns};
use std::path::PathBuf;

/// Timeout applied when no layer sets one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    /// For allowed_commands and disallowed_patterns: REPLACE semantics.
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            working_dir: self.working_dir.or(fallback.working_dir),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
            max_concurrent: self.max_concurrent.or(fallback.max_concurrent),
            allowed_commands: self.allowed_commands.or(fallback.allowed_commands),
            disallowed_patterns: self.disallowed_patterns.or(fallback.disallowed_patterns),
            security_log_path: self.security_log_path.or(fallback.security_log_path),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    pub fn finalize(self) -> AppConfig {
        let timeout_secs = match self.timeout_secs {
            Some(0) => {
                tracing::warn!(
                    "timeout_secs = 0 is not allowed, using {}s",
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }
            Some(t) => t,
            None => DEFAULT_TIMEOUT_SECS,
        };

        AppConfig {
            working_dir: self.working_dir.unwrap_or_else(|| PathBuf::from(".")),
            timeout_secs,
            max_concurrent: self.max_concurrent.filter(|n| *n > 0),
            allowed_commands: self.allowed_commands.unwrap_or_else(default_allowlist),
            disallowed_patterns: self
                .disallowed_patterns
                .unwrap_or_else(default_disallowed_patterns),
            security_log_path: self.security_log_path,
        }
    }
}
