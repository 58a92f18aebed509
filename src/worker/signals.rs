use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use log::{debug, error};
use nix::errno::Errno;
use nix::sys::signal::{self, SigSet, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd;

use crate::error::{Result, SchedulerError};
use crate::models::message::{ChildEvent, ChildStatus, SchedulerEvent};
use crate::models::task::Pid;

fn child_signal_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGCHLD);
    set
}

/// Blocks SIGCHLD on the calling thread. Call before spawning any thread or
/// child so every thread inherits the mask and no notification is lost.
pub fn block_child_signal() -> Result<()> {
    child_signal_set()
        .thread_block()
        .map_err(|e| SchedulerError::SignalSetup(io::Error::from(e)))
}

pub fn spawn_child_watcher(sender: Sender<SchedulerEvent>) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("sigchld-watcher".into())
        .spawn(move || {
            let set = child_signal_set();
            loop {
                if let Err(e) = set.wait() {
                    error!("sigwait failed: {}", e);
                    break;
                }
                // Coalesced deliveries are fine, the loop drains every child.
                if sender.send(SchedulerEvent::ChildStateChanged).is_err() {
                    debug!("Event loop gone, stopping SIGCHLD watcher");
                    break;
                }
            }
        })
        .map_err(SchedulerError::SignalSetup)
}

pub fn send_signal(pid: Pid, sig: Signal) -> Result<()> {
    signal::kill(unistd::Pid::from_raw(pid), sig).map_err(|e| SchedulerError::Signal {
        pid,
        source: io::Error::from(e),
    })
}

/// Collects every pending child state change without blocking, in the order
/// the kernel reports them.
pub fn reap_children() -> Result<Vec<ChildEvent>> {
    let flags = WaitPidFlag::WUNTRACED | WaitPidFlag::WNOHANG;
    let mut events = Vec::new();
    loop {
        match wait::waitpid(None::<unistd::Pid>, Some(flags)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(SchedulerError::Wait(io::Error::from(e))),
            Ok(status) => events.extend(child_event(status)),
        }
    }
    Ok(events)
}

pub fn child_event(status: WaitStatus) -> Option<ChildEvent> {
    let (pid, status) = match status {
        WaitStatus::Exited(pid, code) => (pid, ChildStatus::Exited(code)),
        WaitStatus::Signaled(pid, sig, _) => (pid, ChildStatus::Signaled(sig as i32)),
        WaitStatus::Stopped(pid, _) => (pid, ChildStatus::Stopped),
        _ => return None,
    };
    Some(ChildEvent {
        pid: pid.as_raw(),
        status,
    })
}
