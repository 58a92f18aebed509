use std::path::Path;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};

use crate::error::{Result, SchedulerError};
use crate::models::message::{ChildEvent, ChildStatus, SchedulerEvent};
use crate::models::request::{Request, RequestKind};
use crate::models::task::{Pid, TaskId, TaskState};
use crate::worker::control::ProcessControl;

use super::registry::{Placement, TaskHandle, TaskRegistry};
use super::timer::PreemptionTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exhausted,
}

pub struct Scheduler<C: ProcessControl> {
    registry: TaskRegistry,
    timer: PreemptionTimer,
    control: C,
}

impl<C: ProcessControl> Scheduler<C> {
    pub fn new(control: C, quantum: Duration) -> Self {
        Self {
            registry: TaskRegistry::new(),
            timer: PreemptionTimer::new(quantum),
            control,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn timer(&self) -> &PreemptionTimer {
        &self.timer
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn launch(&mut self, path: &Path, placement: Placement) -> Result<TaskHandle> {
        let pid = self.control.spawn(path)?;
        Ok(self.register(pid, path.display().to_string(), placement))
    }

    pub fn register(&mut self, pid: Pid, name: String, placement: Placement) -> TaskHandle {
        let handle = self.registry.add_task(pid, name, placement);
        if let Some(task) = self.registry.get(handle) {
            info!("Task {} ({}) registered with pid {}", task.id, task.name, task.pid);
        }
        handle
    }

    pub fn attach_controller(&mut self, pid: Pid, name: String) -> TaskHandle {
        let handle = self.register(pid, name, Placement::Append);
        info!("Controller attached as pid {}", pid);
        handle
    }

    pub fn start(&mut self) -> Result<()> {
        if self.registry.is_empty() {
            return Err(SchedulerError::NoTasks);
        }
        self.resume_current();
        Ok(())
    }

    /// Runs until every task has died.
    pub fn run(&mut self, events: &Receiver<SchedulerEvent>) -> Result<()> {
        self.start()?;

        loop {
            if self.timer.is_expired_at(Instant::now()) {
                self.on_quantum_expired();
                continue;
            }

            let event = match self.timer.deadline() {
                Some(deadline) => match events.recv_deadline(deadline) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(SchedulerError::EventSourceClosed)
                    }
                },
                None => events.recv().map_err(|_| SchedulerError::EventSourceClosed)?,
            };

            if self.dispatch(event)? == Flow::Exhausted {
                info!("All tasks finished");
                return Ok(());
            }
        }
    }

    pub fn dispatch(&mut self, event: SchedulerEvent) -> Result<Flow> {
        match event {
            SchedulerEvent::ChildStateChanged => self.on_children_changed(),
            SchedulerEvent::Command(rq, reply) => {
                let code = self.handle_request(&rq)?;
                if reply.send(code).is_err() {
                    warn!("Controller reply dropped for {:?}", rq.kind);
                }
                Ok(Flow::Continue)
            }
            SchedulerEvent::ControllerGone => {
                warn!("Controller disconnected, continuing with remaining tasks");
                Ok(Flow::Continue)
            }
        }
    }

    // Rotation waits for the stop notification.
    pub fn on_quantum_expired(&mut self) {
        self.timer.disarm();
        let Some(task) = self.registry.current_task() else {
            return;
        };
        debug!("Quantum expired for task {} (pid {})", task.id, task.pid);
        let pid = task.pid;
        if let Err(e) = self.control.pause(pid) {
            warn!("{}", e);
        }
    }

    pub fn on_children_changed(&mut self) -> Result<Flow> {
        for event in self.control.reap()? {
            if self.on_child_event(event)? == Flow::Exhausted {
                return Ok(Flow::Exhausted);
            }
        }
        Ok(Flow::Continue)
    }

    pub fn on_child_event(&mut self, event: ChildEvent) -> Result<Flow> {
        let Some(handle) = self.registry.find_by_pid(event.pid) else {
            debug!("Ignoring notification for unknown pid {}", event.pid);
            return Ok(Flow::Continue);
        };
        let is_current = self.registry.current() == Some(handle);
        let Some(task) = self.registry.get_mut(handle) else {
            return Ok(Flow::Continue);
        };

        match event.status {
            ChildStatus::Exited(_) | ChildStatus::Signaled(_) => {
                task.state = TaskState::Dead;
                match event.status {
                    ChildStatus::Signaled(sig) => {
                        info!("Task {} (pid {}) killed by signal {}", task.id, task.pid, sig)
                    }
                    _ => info!("Task {} (pid {}) exited: {:?}", task.id, task.pid, event.status),
                }

                if is_current {
                    if self.registry.advance().is_none() {
                        self.timer.disarm();
                        return Ok(Flow::Exhausted);
                    }
                    self.registry.remove(handle)?;
                    self.resume_current();
                } else {
                    self.registry.remove(handle)?;
                }
            }
            ChildStatus::Stopped => {
                // A task that never ran is only confirming its launch pause.
                if task.state != TaskState::Starting {
                    task.state = TaskState::Stopped;
                }
                debug!("Task {} (pid {}) stopped", task.id, task.pid);

                if is_current {
                    self.registry.advance();
                    self.resume_current();
                }
            }
        }
        Ok(Flow::Continue)
    }

    pub fn handle_request(&mut self, rq: &Request) -> Result<i32> {
        info!("Controller command: {:?}", rq.kind);
        match rq.kind {
            RequestKind::ListTasks => {
                for line in self.listing() {
                    println!("{}", line);
                }
                Ok(0)
            }
            RequestKind::KillTask => Ok(self.kill_task(rq.task_arg)),
            RequestKind::SpawnTask => self.spawn_task(&rq.exec_arg),
            RequestKind::Unknown(code) => {
                warn!("Unsupported request kind {}", code);
                Ok(-libc::ENOSYS)
            }
        }
    }

    pub fn listing(&self) -> Vec<String> {
        let current = self.registry.current_task().map(|t| t.id);
        self.registry
            .iter_from_current()
            .map(|t| {
                let marker = if Some(t.id) == current { " (current)" } else { "" };
                format!("id:{} PID:{} name:{} state:{}{}", t.id, t.pid, t.name, t.state, marker)
            })
            .collect()
    }

    /// Removal happens when the death is observed, not here.
    pub fn kill_task(&mut self, id: i32) -> i32 {
        let Some(task) = TaskId::try_from(id)
            .ok()
            .and_then(|id| self.registry.find_by_id(id))
            .and_then(|h| self.registry.get(h))
        else {
            warn!("Kill requested for unknown task {}", id);
            return -1;
        };

        let (task_id, pid) = (task.id, task.pid);
        match self.control.terminate(pid) {
            Ok(()) => {
                info!("Task {} (pid {}) has been killed", task_id, pid);
                0
            }
            Err(e) => {
                warn!("{}", e);
                -1
            }
        }
    }

    pub fn spawn_task(&mut self, path: &Path) -> Result<i32> {
        let handle = self.launch(path, Placement::AfterCurrent)?;
        if let Some(task) = self.registry.get(handle) {
            info!("Created task {} from {}", task.id, task.name);
        }
        Ok(0)
    }

    fn resume_current(&mut self) {
        let Some(task) = self.registry.current().and_then(|h| self.registry.get_mut(h)) else {
            return;
        };
        task.state = TaskState::Running;
        let (id, pid) = (task.id, task.pid);

        self.timer.arm();
        info!("Resuming task {} (pid {})", id, pid);
        if let Err(e) = self.control.resume(pid) {
            warn!("{}", e);
        }
    }
}
