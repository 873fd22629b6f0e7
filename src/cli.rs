use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cmdgate", version, about = "Run allowlisted project commands")]
pub struct Cli {
    /// Path to config file (overrides the project config file)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory commands run in
    #[arg(short = 'C', long, global = true)]
    pub working_dir: Option<PathBuf>,

    /// Command timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one allowlisted command
    Run {
        /// The command, exactly as listed (e.g. "npm install")
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        command: Vec<String>,

        /// Print the result or error as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the allowlist
    List,
    /// Check that every allowlist entry passes the disallowed pattern check
    Check,
    /// Read commands from stdin, one per line
    Shell,
}

impl Commands {
    /// The submitted command text for `run`, words joined by single spaces.
    pub fn command_text(&self) -> Option<String> {
        match self {
            Commands::Run { command, .. } => Some(command.join(" ")),
            _ => None,
        }
    }
}
