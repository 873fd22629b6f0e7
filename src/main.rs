use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use cmdgate::cli::{Cli, Commands};
use cmdgate::config;
use cmdgate::gate::Gatekeeper;
use cmdgate::{logging, report};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing. Logs go to stderr so command output owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config(&cli)?;
    tracing::debug!(
        working_dir = %config.working_dir.display(),
        timeout_secs = config.timeout_secs,
        allowed_commands = config.allowed_commands.len(),
        disallowed_patterns = config.disallowed_patterns.len(),
        "Config loaded"
    );

    let gate = Gatekeeper::from_config(&config)?;

    match &cli.command {
        Commands::Run { json, .. } => {
            let command = cli.command.command_text().unwrap_or_default();
            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let result = gate.run_with_cancel(&command, cancel).await;
            let mut stdout = std::io::stdout().lock();
            if *json {
                writeln!(stdout, "{}", report::to_json(&result))?;
            }
            match result {
                Ok(output) => {
                    if !*json {
                        stdout.write_all(output.stdout.as_bytes())?;
                        std::io::stderr().write_all(output.stderr.as_bytes())?;
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    if !*json {
                        eprintln!("error[{}]: {}", e.kind(), e);
                    }
                    Ok(ExitCode::from(report::exit_code(&e)))
                }
            }
        }
        Commands::List => {
            let mut stdout = std::io::stdout().lock();
            for (key, command_line) in gate.policy().spec().iter() {
                if key == command_line {
                    writeln!(stdout, "{key}")?;
                } else {
                    writeln!(stdout, "{key} -> {command_line}")?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let violations = gate.policy().self_test();
            if violations.is_empty() {
                println!(
                    "ok: {} allowed commands, {} disallowed patterns, working dir {}",
                    gate.policy().spec().len(),
                    gate.policy().disallowed().len(),
                    gate.working_dir().display()
                );
                return Ok(ExitCode::SUCCESS);
            }
            for v in &violations {
                println!(
                    "violation: `{}` ({:?}) contains {:?}: {}",
                    v.command, v.site, v.pattern, v.reason
                );
            }
            Ok(ExitCode::FAILURE)
        }
        Commands::Shell => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            cmdgate::shell::run_shell(&gate, stdin, &mut stdout).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
