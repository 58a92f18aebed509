use std::path::Path;

use anyhow::{bail, Context, Result};
use crossbeam_channel::unbounded;
use log::info;

use crate::error::SchedulerError;
use crate::manager::registry::Placement;
use crate::manager::scheduler::Scheduler;
use crate::worker::channel::{self, ControllerChannel};
use crate::worker::control::OsProcessControl;
use crate::worker::{launcher, signals};

use super::config::SchedulerConfig;

pub fn run(config: SchedulerConfig) -> Result<()> {
    if config.tasks.is_empty() && config.shell.is_none() {
        bail!(SchedulerError::NoTasks);
    }

    signals::block_child_signal().context("blocking SIGCHLD")?;

    let mut scheduler = Scheduler::new(OsProcessControl, config.quantum);
    let controller = match &config.shell {
        Some(shell) => Some(start_controller(&mut scheduler, shell)?),
        None => None,
    };

    for path in &config.tasks {
        scheduler
            .launch(path, Placement::Append)
            .with_context(|| format!("launching {}", path.display()))?;
    }
    info!(
        "{} task(s) paused and registered, quantum {:?}",
        scheduler.registry().len(),
        config.quantum
    );

    let (sender, receiver) = unbounded();
    signals::spawn_child_watcher(sender.clone())?;
    if let Some(channel) = controller {
        channel::spawn_command_reader(channel, sender)?;
    }

    scheduler.run(&receiver)?;
    Ok(())
}

fn start_controller(
    scheduler: &mut Scheduler<OsProcessControl>,
    shell: &Path,
) -> Result<ControllerChannel> {
    let (channel, ends) = channel::open_controller_channel().context("creating controller pipes")?;

    let pid = launcher::launch(shell, &ends.as_args(), &ends.raw_fds())
        .with_context(|| format!("launching controller {}", shell.display()))?;
    launcher::await_paused(pid)?;
    drop(ends);

    scheduler.attach_controller(pid, shell.display().to_string());
    Ok(channel)
}
