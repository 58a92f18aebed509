//! Records live in an arena of slots addressed by [`TaskHandle`]; rotation
//! order is a separate vector of handles. Dead tasks stay in place as
//! tombstones until the caller has moved `current` away and removes them.

use log::debug;

use crate::error::{Result, SchedulerError};
use crate::models::task::{Pid, Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append,
    AfterCurrent,
}

#[derive(Debug, Default)]
pub struct TaskRegistry {
    slots: Vec<Option<Task>>,
    order: Vec<TaskHandle>,
    current: Option<TaskHandle>,
    next_id: TaskId,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly launched process in `Starting` state.
    ///
    /// The first task ever added becomes `current`.
    pub fn add_task(&mut self, pid: Pid, name: String, placement: Placement) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;

        let handle = TaskHandle(self.slots.len());
        self.slots.push(Some(Task::new(id, pid, name)));

        let position = match (placement, self.current_position()) {
            (Placement::AfterCurrent, Some(pos)) => pos + 1,
            _ => self.order.len(),
        };
        self.order.insert(position, handle);

        if self.current.is_none() {
            self.current = Some(handle);
        }
        debug!("Registered task {} (pid {}) at rotation slot {}", id, pid, position);
        handle
    }

    pub fn get(&self, handle: TaskHandle) -> Option<&Task> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: TaskHandle) -> Option<&mut Task> {
        self.slots.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub fn current(&self) -> Option<TaskHandle> {
        self.current
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current.and_then(|h| self.get(h))
    }

    pub fn find_by_pid(&self, pid: Pid) -> Option<TaskHandle> {
        self.order
            .iter()
            .copied()
            .find(|&h| self.get(h).is_some_and(|t| t.pid == pid))
    }

    pub fn find_by_id(&self, id: TaskId) -> Option<TaskHandle> {
        self.order
            .iter()
            .copied()
            .find(|&h| self.get(h).is_some_and(|t| t.id == id))
    }

    /// First live task strictly after `current` in circular order. `current`
    /// itself is the last candidate. `None` means the registry is exhausted.
    pub fn next_runnable(&self) -> Option<TaskHandle> {
        let start = self.current_position()?;
        let len = self.order.len();

        (1..=len)
            .map(|step| self.order[(start + step) % len])
            .find(|&h| self.get(h).is_some_and(Task::is_alive))
    }

    pub fn advance(&mut self) -> Option<TaskHandle> {
        let next = self.next_runnable()?;
        self.current = Some(next);
        Some(next)
    }

    /// Removes a task already observed dead. The current task cannot be
    /// removed; advance away from it first.
    pub fn remove(&mut self, handle: TaskHandle) -> Result<Task> {
        let task = self.get(handle).ok_or(SchedulerError::StaleHandle)?;
        if task.is_alive() {
            return Err(SchedulerError::RemoveLive(task.id));
        }
        if self.current == Some(handle) {
            return Err(SchedulerError::RemoveCurrent(task.id));
        }

        self.order.retain(|&h| h != handle);
        self.slots[handle.0].take().ok_or(SchedulerError::StaleHandle)
    }

    pub fn iter_from_current(&self) -> impl Iterator<Item = &Task> + '_ {
        let start = self.current_position().unwrap_or(0);
        let len = self.order.len();
        (0..len).filter_map(move |step| self.get(self.order[(start + step) % len]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn current_position(&self) -> Option<usize> {
        let current = self.current?;
        self.order.iter().position(|&h| h == current)
    }
}
