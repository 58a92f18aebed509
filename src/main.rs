use std::process;

use anyhow::Result;
use clap::Parser;

use rr_scheduler::app::config::{self, SchedulerArgs, SchedulerConfig};
use rr_scheduler::app::{runner, telemetry};

fn main() -> Result<()> {
    config::load_dotenv();
    telemetry::init_logging();

    let args = match SchedulerArgs::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };
    runner::run(SchedulerConfig::from(args))
}
