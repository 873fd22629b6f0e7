use serde::Deserialize;
use std::path::PathBuf;

/// The TOML file structure for cmdgate.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub execution: Option<ExecutionConfig>,
    pub policy: Option<PolicyConfig>,
    pub audit: Option<AuditConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    pub working_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    pub timeout_secs: Option<u64>,
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// If specified, fully replaces the default allowlist.
    pub allowed_commands: Option<Vec<AllowlistEntry>>,
    /// If specified, fully replaces the default disallowed patterns.
    pub disallowed_patterns: Option<Vec<PatternEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    pub security_log: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowlistEntry {
    pub command: String,
    /// Command line to execute; defaults to `command`.
    pub run: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternEntry {
    pub pattern: String,
    pub reason: String,
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub working_dir: PathBuf,
    pub timeout_secs: u64,
    pub max_concurrent: Option<usize>,
    pub allowed_commands: Vec<(String, String)>,
    pub disallowed_patterns: Vec<(String, String)>,
    pub security_log_path: Option<PathBuf>,
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub max_concurrent: Option<usize>,
    pub allowed_commands: Option<Vec<(String, String)>>,
    pub disallowed_patterns: Option<Vec<(String, String)>>,
    pub security_log_path: Option<PathBuf>,
}

impl ConfigFile {
    pub fn to_partial(&self) -> PartialConfig {
        let general = self.general.as_ref();
        let execution = self.execution.as_ref();
        let policy = self.policy.as_ref();

        PartialConfig {
            working_dir: general
                .and_then(|g| g.working_dir.as_ref())
                .map(PathBuf::from),
            timeout_secs: execution.and_then(|e| e.timeout_secs),
            max_concurrent: execution.and_then(|e| e.max_concurrent),
            allowed_commands: policy.and_then(|p| p.allowed_commands.as_ref()).map(|entries| {
                entries
                    .iter()
                    .map(|e| {
                        let run = e.run.clone().unwrap_or_else(|| e.command.clone());
                        (e.command.clone(), run)
                    })
                    .collect()
            }),
            disallowed_patterns: policy
                .and_then(|p| p.disallowed_patterns.as_ref())
                .map(|entries| {
                    entries
                        .iter()
                        .map(|e| (e.pattern.clone(), e.reason.clone()))
                        .collect()
                }),
            security_log_path: self
                .audit
                .as_ref()
                .and_then(|a| a.security_log.as_ref())
                .map(PathBuf::from),
        }
    }
}
