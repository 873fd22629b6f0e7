//! How a `run` outcome is reported to the calling process: exit codes and
//! the `--json` shape.

use serde_json::{json, Value};

use crate::error::{ErrorKind, GateError};
use crate::gate::CommandResult;

/// Process exit code for a failed `run`.
///
/// Execution failures pass the command's own code through when it fits in
/// `1..=255`; anything else maps to 1.
pub fn exit_code(error: &GateError) -> u8 {
    match error {
        GateError::CommandExecutionFailed {
            exit_code: Some(code),
            ..
        } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
        _ => match error.kind() {
            ErrorKind::CommandNotAllowed | ErrorKind::UnsafePattern => 2,
            ErrorKind::SpawnFailed => 127,
            ErrorKind::Timeout => 124,
            ErrorKind::Cancelled => 130,
            ErrorKind::CommandExecutionFailed => 1,
        },
    }
}

/// `{ok: true, stdout, stderr}` or `{ok: false, kind, message, command}`.
pub fn to_json(result: &Result<CommandResult, GateError>) -> Value {
    match result {
        Ok(output) => json!({
            "ok": true,
            "stdout": output.stdout,
            "stderr": output.stderr,
        }),
        Err(e) => json!({
            "ok": false,
            "kind": e.kind(),
            "message": e.to_string(),
            "command": e.command(),
        }),
    }
}
