use std::collections::BTreeMap;

use crate::error::PolicyError;

/// Maps the exact command text a client may submit to the command line that
/// actually runs. Only keys of this map are ever executed.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    entries: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Build a spec from `(command, command_line)` pairs.
    ///
    /// Both sides are trimmed. Every command line must tokenize into at least
    /// one word so that nothing unrunnable reaches the executor.
    pub fn new<I, K, V>(entries: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (command, command_line) in entries {
            let command = command.into().trim().to_string();
            let command_line = command_line.into().trim().to_string();

            if command.is_empty() {
                return Err(PolicyError::EmptyCommand);
            }
            if command_line.is_empty() {
                return Err(PolicyError::EmptyCommandLine { command });
            }
            match shell_words::split(&command_line) {
                Ok(words) if !words.is_empty() => {}
                Ok(_) => return Err(PolicyError::EmptyCommandLine { command }),
                Err(e) => {
                    return Err(PolicyError::UnparseableCommandLine {
                        command,
                        message: e.to_string(),
                    });
                }
            }

            if map.insert(command.clone(), command_line).is_some() {
                tracing::warn!(command = %command, "Duplicate allowlist entry, last one wins");
            }
        }
        Ok(Self { entries: map })
    }

    /// Look up the command line for a normalized command. Exact match only.
    pub fn resolve(&self, command: &str) -> Option<&str> {
        self.entries.get(command).map(String::as_str)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.entries.contains_key(command)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whitespace normalization applied to submitted commands before lookup.
/// Only leading and trailing whitespace is removed; inner spacing must match.
pub fn normalize(command: &str) -> &str {
    command.trim()
}
