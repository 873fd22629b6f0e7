//! Line-oriented command session.
//!
//! Reads one command per line, runs it through the [`Gatekeeper`], and writes
//! output and errors to a single stream in submission order. A few words are
//! handled locally instead of being submitted: `help`, `history`, `exit` and
//! `quit`.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::exec::ProcessExecutor;
use crate::gate::Gatekeeper;

const PROMPT: &str = "$ ";

/// Submitted commands, oldest first. Consecutive repeats are stored once.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn push(&mut self, command: &str) {
        if self.entries.last().map(String::as_str) != Some(command) {
            self.entries.push(command.to_string());
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// Run the session until EOF, `exit`, or Ctrl-C at the prompt.
///
/// Ctrl-C while a command runs cancels that command only.
pub async fn run_shell<E, R, W>(
    gate: &Gatekeeper<E>,
    input: R,
    out: &mut W,
) -> anyhow::Result<History>
where
    E: ProcessExecutor,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut history = History::default();

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            writeln!(out)?;
            break;
        };

        let command = line.trim();
        match command {
            "" => continue,
            "exit" | "quit" => break,
            "help" => {
                writeln!(out, "Allowed commands:")?;
                for (key, _) in gate.policy().spec().iter() {
                    writeln!(out, "  {key}")?;
                }
                continue;
            }
            "history" => {
                for (i, entry) in history.entries().iter().enumerate() {
                    writeln!(out, "{:>4}  {entry}", i + 1)?;
                }
                continue;
            }
            _ => {}
        }

        history.push(command);

        let cancel = CancellationToken::new();
        let run = gate.run_with_cancel(command, cancel.clone());
        tokio::pin!(run);
        let result = tokio::select! {
            result = &mut run => result,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                run.await
            }
        };

        match result {
            Ok(output) => {
                out.write_all(output.stdout.as_bytes())?;
                out.write_all(output.stderr.as_bytes())?;
            }
            Err(e) => writeln!(out, "error[{}]: {}", e.kind(), e)?,
        }
    }

    Ok(history)
}
