use std::fmt;

pub type TaskId = u64;

pub type Pid = i32;

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub pid: Pid,
    pub name: String,
    pub state: TaskState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Forked and paused, never resumed yet.
    Starting,
    Running,
    Stopped,
    Dead,
}

impl Task {
    pub fn new(id: TaskId, pid: Pid, name: String) -> Self {
        Self {
            id,
            pid,
            name,
            state: TaskState::Starting,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state != TaskState::Dead
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Starting => "starting",
            TaskState::Running => "running",
            TaskState::Stopped => "stopped",
            TaskState::Dead => "dead",
        };
        f.write_str(label)
    }
}
