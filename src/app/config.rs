use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Round-robin scheduler for worker executables, preempted with SIGSTOP.
#[derive(Parser, Debug)]
#[command(name = "scheduler", version, about)]
pub struct SchedulerArgs {
    /// Worker executables to launch, in rotation order.
    #[arg(value_name = "TASKS")]
    pub tasks: Vec<PathBuf>,

    /// Scheduling quantum in milliseconds.
    #[arg(long, env = "SCHED_QUANTUM_MS", default_value = "2000")]
    pub quantum_ms: NonZeroU64,

    /// Launch this controller and accept list/kill/spawn commands from it.
    #[arg(long, env = "SCHED_SHELL")]
    pub shell: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub quantum: Duration,
    pub tasks: Vec<PathBuf>,
    pub shell: Option<PathBuf>,
}

impl From<SchedulerArgs> for SchedulerConfig {
    fn from(args: SchedulerArgs) -> Self {
        Self {
            quantum: Duration::from_millis(args.quantum_ms.get()),
            tasks: args.tasks,
            shell: args.shell,
        }
    }
}
