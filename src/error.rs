use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::task::{Pid, TaskId};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no tasks to schedule")]
    NoTasks,
    #[error("failed to launch {}: {source}", .path.display())]
    Launch { path: PathBuf, source: io::Error },
    #[error("invalid executable path: {0}")]
    InvalidPath(String),
    #[error("command channel: {0}")]
    Channel(#[source] io::Error),
    #[error("signal setup: {0}")]
    SignalSetup(#[source] io::Error),
    #[error("waitpid: {0}")]
    Wait(#[source] io::Error),
    #[error("failed to signal pid {pid}: {source}")]
    Signal { pid: Pid, source: io::Error },
    #[error("pid {pid} did not pause before exec")]
    UnexpectedStatus { pid: Pid },
    #[error("event sources closed")]
    EventSourceClosed,
    #[error("task handle no longer refers to a record")]
    StaleHandle,
    #[error("task {0} is still alive")]
    RemoveLive(TaskId),
    #[error("task {0} is current")]
    RemoveCurrent(TaskId),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
