/// Returns the default allowlist of (command, command line) tuples.
/// Keys are what a client submits; values are what runs.
pub fn default_allowlist() -> Vec<(String, String)> {
    [
        "npm install",
        "npm ci",
        "npm run build",
        "git status",
        "git pull",
    ]
    .into_iter()
    .map(|c| (c.to_string(), c.to_string()))
    .collect()
}

/// Returns the default denylist of (substring, reason) tuples.
/// The allowlist is the security boundary; these guard against allowlist
/// entries that would compose commands.
pub fn default_disallowed_patterns() -> Vec<(String, String)> {
    vec![
        ("rm -rf".into(), "Recursive deletion not allowed".into()),
        ("&&".into(), "Command chaining not allowed".into()),
        ("|".into(), "Piping not allowed".into()),
        (";".into(), "Command sequencing not allowed".into()),
        ("`".into(), "Command substitution not allowed".into()),
        ("$(".into(), "Command substitution not allowed".into()),
        ("../".into(), "Directory traversal not allowed".into()),
        (">".into(), "Output redirection not allowed".into()),
        ("<".into(), "Input redirection not allowed".into()),
        ("\n".into(), "Multi-line commands not allowed".into()),
    ]
}
