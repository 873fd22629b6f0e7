mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use cmdgate::error::{ErrorKind, GateError};
use cmdgate::exec::SystemExecutor;
use cmdgate::gate::Gatekeeper;
use cmdgate::policy::defaults::default_disallowed_patterns;
use cmdgate::policy::{CommandPolicy, CommandSpec, DisallowedPatternSet};
use common::setup_workspace;
use tempfile::TempDir;

fn system_gate(ws: &TempDir, entries: &[(&str, &str)], timeout: Duration) -> Gatekeeper {
    let spec = CommandSpec::new(entries.iter().copied()).unwrap();
    let disallowed = DisallowedPatternSet::new(&default_disallowed_patterns()).unwrap();
    Gatekeeper::new(
        CommandPolicy::new(spec, disallowed),
        SystemExecutor,
        ws.path(),
        timeout,
    )
    .unwrap()
}

// ============================================================
// Normal execution
// ============================================================

#[tokio::test]
async fn test_echo_stdout() {
    let ws = setup_workspace();
    let gate = system_gate(&ws, &[("hello", "echo hello")], Duration::from_secs(5));

    let result = gate.run("hello").await.unwrap();
    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.stderr, "");
}

#[tokio::test]
async fn test_runs_in_working_directory() {
    let ws = setup_workspace();
    let canonical = std::fs::canonicalize(ws.path()).unwrap();
    let gate = system_gate(&ws, &[("where", "pwd")], Duration::from_secs(5));

    let result = gate.run("where").await.unwrap();
    assert_eq!(result.stdout.trim(), canonical.to_str().unwrap());
}

#[tokio::test]
async fn test_sees_files_in_working_directory() {
    let ws = setup_workspace();
    std::fs::write(ws.path().join("package.json"), "{}").unwrap();
    let gate = system_gate(&ws, &[("files", "ls")], Duration::from_secs(5));

    let result = gate.run("files").await.unwrap();
    assert!(result.stdout.contains("package.json"));
}

// ============================================================
// Failures
// ============================================================

#[tokio::test]
async fn test_failing_command_surfaces_first_stderr_line() {
    let ws = setup_workspace();
    let gate = system_gate(
        &ws,
        &[("missing", "ls does-not-exist-here")],
        Duration::from_secs(5),
    );

    let err = gate.run("missing").await.unwrap_err();
    match err {
        GateError::CommandExecutionFailed {
            command,
            exit_code,
            message,
        } => {
            assert_eq!(command, "missing");
            assert_ne!(exit_code, Some(0));
            assert!(message.contains("does-not-exist-here"));
            assert!(!message.contains('\n'));
        }
        other => panic!("expected CommandExecutionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exit_code_without_stderr() {
    let ws = setup_workspace();
    let gate = system_gate(&ws, &[("nope", "false")], Duration::from_secs(5));

    let err = gate.run("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CommandExecutionFailed);
    assert!(err.to_string().contains("exited with code 1"));
}

#[tokio::test]
async fn test_missing_program_is_spawn_failed() {
    let ws = setup_workspace();
    let gate = system_gate(
        &ws,
        &[("ghost", "cmdgate-test-no-such-program")],
        Duration::from_secs(5),
    );

    let err = gate.run("ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SpawnFailed);
}

// ============================================================
// Timeout behavior
// ============================================================

#[tokio::test]
async fn test_timeout_kills_process() {
    let ws = setup_workspace();
    let gate = system_gate(&ws, &[("nap", "sleep 60")], Duration::from_secs(1));

    let start = Instant::now();
    let err = gate.run("nap").await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, GateError::Timeout { timeout_secs: 1, .. }));
    assert!(
        elapsed.as_secs() < 5,
        "timeout should fire within ~1 second, took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_timeout_kills_whole_process_group() {
    let ws = setup_workspace();
    let marker = ws.path().join("marker");
    // `sh` forks `sleep`, then would create the marker once it returns.
    let spec = CommandSpec::new([("late", "sh -c 'sleep 3; touch marker'")]).unwrap();
    let disallowed = DisallowedPatternSet::new(&[]).unwrap();
    let gate = Gatekeeper::new(
        CommandPolicy::new(spec, disallowed),
        SystemExecutor,
        ws.path(),
        Duration::from_secs(1),
    )
    .unwrap();

    let start = Instant::now();
    let err = gate.run("late").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(start.elapsed() < Duration::from_secs(3));

    // Outlive the original sleep; nothing in the group may still be running.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!marker.exists(), "descendants should be killed with the group");
}

// ============================================================
// No shell interpretation
// ============================================================

#[tokio::test]
async fn test_glob_and_variables_are_not_expanded() {
    let ws = setup_workspace();
    std::fs::write(ws.path().join("a.txt"), "").unwrap();
    let gate = system_gate(&ws, &[("literal", "echo *.txt $HOME")], Duration::from_secs(5));

    let result = gate.run("literal").await.unwrap();
    assert_eq!(result.stdout, "*.txt $HOME\n");
}

// ============================================================
// Concurrency
// ============================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_do_not_interleave() {
    let ws = setup_workspace();
    let gate = Arc::new(system_gate(
        &ws,
        &[("count", "seq 1 2000")],
        Duration::from_secs(10),
    ));
    let expected: String = (1..=2000).map(|i| format!("{i}\n")).collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.run("count").await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.stdout, expected);
    }
}
