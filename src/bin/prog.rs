//! Demo worker: prints a numbered line per step, then exits.

use std::thread;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "prog", about = "Demo worker for the round-robin scheduler")]
struct ProgArgs {
    /// Number of steps before exiting.
    #[arg(long, env = "PROG_STEPS", default_value_t = 20)]
    steps: u32,

    /// Delay between steps in milliseconds.
    #[arg(long, env = "PROG_DELAY_MS", default_value_t = 500)]
    delay_ms: u64,
}

fn main() {
    let args = ProgArgs::parse();
    let pid = std::process::id();

    for step in 1..=args.steps {
        println!("prog[{}]: step {}/{}", pid, step, args.steps);
        thread::sleep(Duration::from_millis(args.delay_ms));
    }
}
