use regex::RegexSet;
use serde::Serialize;

use crate::error::PolicyError;

/// Literal substrings that must never appear in a command, even an
/// allowlisted one. Compiled once into a [`RegexSet`] of escaped literals.
#[derive(Debug, Clone)]
pub struct DisallowedPatternSet {
    set: RegexSet,
    patterns: Vec<String>,
    reasons: Vec<String>,
}

/// The first disallowed pattern found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub pattern: String,
    pub reason: String,
}

impl DisallowedPatternSet {
    /// Create a set from `(substring, reason)` tuples.
    pub fn new(patterns: &[(String, String)]) -> Result<Self, PolicyError> {
        if patterns.iter().any(|(p, _)| p.is_empty()) {
            return Err(PolicyError::EmptyPattern);
        }
        let (literals, reasons): (Vec<_>, Vec<_>) = patterns.iter().cloned().unzip();
        let escaped: Vec<String> = literals.iter().map(|p| regex::escape(p)).collect();
        Ok(Self {
            set: RegexSet::new(&escaped)?,
            patterns: literals,
            reasons,
        })
    }

    /// Returns the earliest-declared pattern contained in `text`, if any.
    pub fn check(&self, text: &str) -> Option<PatternMatch> {
        let first = self.set.matches(text).into_iter().next()?;
        Some(PatternMatch {
            pattern: self.patterns[first].clone(),
            reason: self.reasons[first].clone(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.patterns
            .iter()
            .zip(&self.reasons)
            .map(|(p, r)| (p.as_str(), r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
