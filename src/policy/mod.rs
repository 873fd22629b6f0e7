pub mod allowlist;
pub mod defaults;
pub mod patterns;

use serde::Serialize;

pub use allowlist::{normalize, CommandSpec};
pub use patterns::{DisallowedPatternSet, PatternMatch};

use crate::config::AppConfig;
use crate::error::{GateError, PolicyError};

/// Immutable execution policy: the allowlist plus the disallowed patterns.
///
/// Built once at startup and handed to the gatekeeper. Nothing mutates it
/// afterwards, so one instance can be shared across concurrent calls.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    spec: CommandSpec,
    disallowed: DisallowedPatternSet,
}

/// Which side of an allowlist entry tripped the self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSite {
    Command,
    CommandLine,
}

/// An allowlist entry that can never run because it contains a disallowed
/// pattern.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyViolation {
    pub command: String,
    pub site: ViolationSite,
    pub pattern: String,
    pub reason: String,
}

impl CommandPolicy {
    pub fn new(spec: CommandSpec, disallowed: DisallowedPatternSet) -> Self {
        Self { spec, disallowed }
    }

    /// The compiled-in allowlist and denylist.
    pub fn with_defaults() -> Result<Self, PolicyError> {
        let spec = CommandSpec::new(defaults::default_allowlist())?;
        let disallowed = DisallowedPatternSet::new(&defaults::default_disallowed_patterns())?;
        Ok(Self::new(spec, disallowed))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, PolicyError> {
        let spec = CommandSpec::new(config.allowed_commands.iter().cloned())?;
        let disallowed = DisallowedPatternSet::new(&config.disallowed_patterns)?;
        Ok(Self::new(spec, disallowed))
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn disallowed(&self) -> &DisallowedPatternSet {
        &self.disallowed
    }

    /// Validate a submitted command and return the command line to run.
    ///
    /// 1. The normalized command must be an allowlist key.
    /// 2. Neither the command nor its command line may contain a disallowed
    ///    pattern.
    pub fn authorize(&self, command: &str) -> Result<&str, GateError> {
        let normalized = normalize(command);

        let Some(command_line) = self.spec.resolve(normalized) else {
            return Err(GateError::CommandNotAllowed {
                command: normalized.to_string(),
            });
        };

        if let Some(hit) = self
            .disallowed
            .check(normalized)
            .or_else(|| self.disallowed.check(command_line))
        {
            return Err(GateError::UnsafePattern {
                command: normalized.to_string(),
                pattern: hit.pattern,
                reason: hit.reason,
            });
        }

        Ok(command_line)
    }

    /// Report every allowlist entry that contains a disallowed pattern in its
    /// key or its command line. An empty result means every entry can run.
    pub fn self_test(&self) -> Vec<PolicyViolation> {
        let mut violations = Vec::new();
        for (command, command_line) in self.spec.iter() {
            let hits = [
                (ViolationSite::Command, self.disallowed.check(command)),
                (ViolationSite::CommandLine, self.disallowed.check(command_line)),
            ];
            for (site, hit) in hits {
                if let Some(hit) = hit {
                    violations.push(PolicyViolation {
                        command: command.to_string(),
                        site,
                        pattern: hit.pattern,
                        reason: hit.reason,
                    });
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn policy_with(entries: &[(&str, &str)]) -> CommandPolicy {
        let spec = CommandSpec::new(entries.iter().copied()).unwrap();
        let disallowed =
            DisallowedPatternSet::new(&defaults::default_disallowed_patterns()).unwrap();
        CommandPolicy::new(spec, disallowed)
    }

    #[test]
    fn default_policy_passes_self_test() {
        let policy = CommandPolicy::with_defaults().unwrap();
        assert!(policy.self_test().is_empty());
        assert_eq!(policy.spec().len(), 5);
    }

    #[test]
    fn authorize_returns_command_line() {
        let policy = CommandPolicy::with_defaults().unwrap();
        assert_eq!(policy.authorize("npm install").unwrap(), "npm install");
        assert_eq!(policy.authorize("  git status\n").unwrap(), "git status");
    }

    #[test]
    fn unknown_commands_are_not_allowed() {
        let policy = CommandPolicy::with_defaults().unwrap();
        for input in ["rm -rf /", "git status && rm -rf /", "", "git", "ls"] {
            let err = policy.authorize(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CommandNotAllowed, "input: {input:?}");
        }
    }

    #[test]
    fn allowlisted_key_with_pattern_is_unsafe() {
        let policy = policy_with(&[("status; reboot", "git status")]);
        let err = policy.authorize("status; reboot").unwrap_err();
        match err {
            GateError::UnsafePattern { pattern, .. } => assert_eq!(pattern, ";"),
            other => panic!("expected UnsafePattern, got {other:?}"),
        }
    }

    #[test]
    fn allowlisted_value_with_pattern_is_unsafe() {
        let policy = policy_with(&[("cleanup", "rm -rf build")]);
        let err = policy.authorize("cleanup").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsafePattern);
    }

    #[test]
    fn self_test_reports_each_site() {
        let policy = policy_with(&[
            ("ok", "git status"),
            ("logs | tail", "cat ../log"),
        ]);
        let violations = policy.self_test();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.command == "logs | tail"));
        assert_eq!(violations[0].site, ViolationSite::Command);
        assert_eq!(violations[1].site, ViolationSite::CommandLine);
        assert_eq!(violations[1].pattern, "../");
    }
}
