pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::Cli;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the global config dir.
pub const CONFIG_FILE_NAME: &str = "cmdgate.toml";

/// Load configuration by merging global, project, and CLI sources.
/// Precedence: CLI > `--config` file or project config > global config > defaults.
///
/// Missing config files are handled gracefully (defaults apply). A file named
/// with `--config` must exist and parse.
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    // Layer 1: Global config (~/.config/cmdgate/cmdgate.toml or platform equivalent)
    let global = load_global_config();

    // The working directory decides where the project config lives.
    let working_dir = cli
        .working_dir
        .clone()
        .or_else(|| global.working_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    // Layer 2: explicit config file, or the project config in the working dir.
    let project = match &cli.config {
        Some(path) => parse_config_file(path)?.to_partial(),
        None => load_project_config(&working_dir),
    };

    // Layer 3: CLI args (converted to PartialConfig)
    let cli_partial = cli_to_partial(cli);

    // Merge: CLI > project > global > defaults
    let config = cli_partial
        .with_fallback(project)
        .with_fallback(global)
        .finalize();

    Ok(config)
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => load_toml_file(&p).unwrap_or_default(),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// Load project config from <working_dir>/cmdgate.toml.
/// Returns empty PartialConfig if file not found.
fn load_project_config(working_dir: &Path) -> PartialConfig {
    load_toml_file(&working_dir.join(CONFIG_FILE_NAME)).unwrap_or_default()
}

/// Read and parse a config file, reporting every failure.
pub fn parse_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config_file =
        toml::from_str::<ConfigFile>(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config_file)
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns None on file-not-found; parse errors are logged and skipped.
fn load_toml_file(path: &Path) -> Option<PartialConfig> {
    match parse_config_file(path) {
        Ok(config_file) => Some(config_file.to_partial()),
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Config error: {}", e);
            None
        }
    }
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/cmdgate/cmdgate.toml
/// macOS: ~/Library/Application Support/cmdgate/cmdgate.toml
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "cmdgate")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Convert CLI arguments to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    PartialConfig {
        working_dir: cli.working_dir.clone(),
        timeout_secs: cli.timeout,
        ..Default::default()
    }
}
