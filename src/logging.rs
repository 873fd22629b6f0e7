use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Build the log filter from `RUST_LOG`-style directives.
///
/// Given directives are used as-is, so a bare `debug` raises every target.
pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| match EnvFilter::try_new(d) {
            Ok(filter) => Some(filter),
            Err(e) => {
                eprintln!("Ignoring invalid RUST_LOG {d:?}: {e}");
                None
            }
        })
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
