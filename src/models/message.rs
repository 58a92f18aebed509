use crossbeam_channel::Sender;

use super::request::Request;
use super::task::Pid;

#[derive(Debug)]
pub enum SchedulerEvent {
    /// At least one child changed state.
    ChildStateChanged,
    Command(Request, Sender<i32>),
    ControllerGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEvent {
    pub pid: Pid,
    pub status: ChildStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    Exited(i32),
    Signaled(i32),
    Stopped,
}

impl ChildStatus {
    pub fn is_dead(&self) -> bool {
        matches!(self, ChildStatus::Exited(_) | ChildStatus::Signaled(_))
    }
}
