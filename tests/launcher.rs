//! Launch, pause and reap real processes.
//!
//! Reaping waits on any child, so everything lives in one test to keep
//! this binary's children to itself.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use rr_scheduler::models::message::ChildStatus;
use rr_scheduler::models::task::Pid;
use rr_scheduler::worker::control::{OsProcessControl, ProcessControl};
use rr_scheduler::worker::launcher;

fn wait_for_deaths(control: &mut OsProcessControl, pids: &[Pid]) -> Vec<(Pid, ChildStatus)> {
    let deadline = Instant::now() + Duration::from_secs(20);
    let mut deaths = Vec::new();

    while deaths.len() < pids.len() {
        assert!(Instant::now() < deadline, "children did not exit: {:?}", deaths);
        for event in control.reap().unwrap() {
            if pids.contains(&event.pid) && event.status.is_dead() {
                deaths.push((event.pid, event.status));
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
    deaths
}

#[test]
fn workers_stay_paused_until_resumed() {
    let prog = Path::new(env!("CARGO_BIN_EXE_prog"));
    let mut control = OsProcessControl;

    let args = ["--steps", "1", "--delay-ms", "1"].map(String::from);
    let finisher = launcher::launch(prog, &args, &[]).unwrap();
    launcher::await_paused(finisher).unwrap();

    let victim = control.spawn(prog).unwrap();

    // Nothing is runnable yet, so nothing can have exited.
    thread::sleep(Duration::from_millis(100));
    assert!(control.reap().unwrap().is_empty());

    control.resume(finisher).unwrap();
    control.terminate(victim).unwrap();

    let deaths = wait_for_deaths(&mut control, &[finisher, victim]);
    assert!(deaths.contains(&(finisher, ChildStatus::Exited(0))), "{:?}", deaths);
    assert!(
        deaths.contains(&(victim, ChildStatus::Signaled(libc::SIGKILL))),
        "{:?}",
        deaths
    );
}

#[test]
fn missing_executable_is_rejected_before_fork() {
    let err = launcher::launch(Path::new("bad\0path"), &[], &[]).unwrap_err();
    assert!(err.to_string().contains("invalid executable path"));
}
