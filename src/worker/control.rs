use std::path::Path;

use nix::sys::signal::Signal;

use crate::error::Result;
use crate::models::message::ChildEvent;
use crate::models::task::Pid;

use super::{launcher, signals};

pub trait ProcessControl {
    /// Starts `path` as a new process and returns once it is paused.
    fn spawn(&mut self, path: &Path) -> Result<Pid>;
    fn pause(&mut self, pid: Pid) -> Result<()>;
    fn resume(&mut self, pid: Pid) -> Result<()>;
    fn terminate(&mut self, pid: Pid) -> Result<()>;
    fn reap(&mut self) -> Result<Vec<ChildEvent>>;
}

#[derive(Debug, Default)]
pub struct OsProcessControl;

impl ProcessControl for OsProcessControl {
    fn spawn(&mut self, path: &Path) -> Result<Pid> {
        let pid = launcher::launch(path, &[], &[])?;
        launcher::await_paused(pid)?;
        Ok(pid)
    }

    fn pause(&mut self, pid: Pid) -> Result<()> {
        signals::send_signal(pid, Signal::SIGSTOP)
    }

    fn resume(&mut self, pid: Pid) -> Result<()> {
        signals::send_signal(pid, Signal::SIGCONT)
    }

    fn terminate(&mut self, pid: Pid) -> Result<()> {
        signals::send_signal(pid, Signal::SIGKILL)
    }

    fn reap(&mut self) -> Result<Vec<ChildEvent>> {
        signals::reap_children()
    }
}
