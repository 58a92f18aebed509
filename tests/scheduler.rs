//! End-to-end runs of the `scheduler` binary against real `prog` workers.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn command(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scheduler"));
    cmd.args(args)
        .env_remove("SCHED_SHELL")
        .env_remove("SCHED_QUANTUM_MS")
        .env("RUST_LOG", "info")
        .env("PROG_STEPS", "4")
        .env("PROG_DELAY_MS", "20");
    cmd
}

fn scheduler(args: &[&str]) -> Output {
    command(args).output().expect("failed to run scheduler")
}

/// Runs the dynamic variant with `script` piped into the controller.
fn scheduler_with_shell(args: &[&str], script: &str) -> Output {
    let mut child = command(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start scheduler");

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(script.as_bytes()).unwrap();
    drop(stdin);

    child.wait_with_output().expect("failed to wait for scheduler")
}

fn transcript(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn pid_of(transcript: &str, id: u64) -> String {
    let prefix = format!("id:{} PID:", id);
    let line = transcript
        .lines()
        .find_map(|l| l.split_once(&prefix).map(|(_, rest)| rest.to_string()))
        .unwrap_or_else(|| panic!("task {} missing from listing:\n{}", id, transcript));
    line.split_whitespace().next().unwrap().to_string()
}

#[test]
fn runs_every_task_to_completion() {
    let prog = env!("CARGO_BIN_EXE_prog");
    let output = scheduler(&["--quantum-ms", "30", prog, prog, prog]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "scheduler failed: {}", stdout);
    assert_eq!(stdout.matches("step 4/4").count(), 3, "{}", stdout);
}

#[test]
fn no_tasks_is_fatal() {
    let output = scheduler(&[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn unlaunchable_task_dies_and_the_rest_finish() {
    let prog = env!("CARGO_BIN_EXE_prog");
    let output = scheduler(&["--quantum-ms", "30", "/nonexistent/worker", prog]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "scheduler failed: {}", stdout);
    assert_eq!(stdout.matches("step 4/4").count(), 1, "{}", stdout);
}

#[test]
fn zero_quantum_is_a_fatal_startup_error() {
    let prog = env!("CARGO_BIN_EXE_prog");
    let output = scheduler(&["--quantum-ms", "0", prog]);
    assert_eq!(output.status.code(), Some(1));

    let output = scheduler(&["--quantum-ms", "soon", prog]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_still_exits_cleanly() {
    let output = scheduler(&["--help"]);
    assert!(output.status.success());
}

#[test]
fn controller_lists_kills_and_spawns_real_tasks() {
    let prog = env!("CARGO_BIN_EXE_prog");
    let shell = env!("CARGO_BIN_EXE_shell");
    let script = format!("p\nk 99\nk 2\ne {}\nq\n", prog);
    let output = scheduler_with_shell(&["--quantum-ms", "500", "--shell", shell, prog, prog], &script);

    let out = transcript(&output);
    assert!(output.status.success(), "scheduler failed:\n{}", out);

    // The controller is task 0 and is running while it issues commands.
    assert!(out.contains("state:running (current)"), "{}", out);
    let victim = pid_of(&out, 2);

    assert!(out.contains("Task 99 not found"), "{}", out);
    assert!(out.contains("Sent kill signal for task 2"), "{}", out);
    assert!(out.contains(&format!("Spawned {}", prog)), "{}", out);
    assert!(out.contains("killed by signal 9"), "{}", out);
    assert!(out.contains("Controller disconnected"), "{}", out);

    // Task 1 and the spawned task 3 finish; the killed task never ran.
    assert_eq!(out.matches("step 4/4").count(), 2, "{}", out);
    assert!(!out.contains(&format!("prog[{}]", victim)), "{}", out);
    assert!(!out.contains("Resuming task 2 ("), "{}", out);

    // Spawned right after the controller, so it runs before task 1.
    let spawned = out.find("Resuming task 3 (").expect("task 3 never resumed");
    let first = out.find("Resuming task 1 (").expect("task 1 never resumed");
    assert!(spawned < first, "{}", out);
}
