//! Controller for `scheduler --shell`. Launched with the request-pipe write
//! end and the response-pipe read end as its two arguments. Reads commands
//! from the terminal, or line by line when stdin is not one.

use std::os::fd::RawFd;

use anyhow::{ensure, Result};
use clap::Parser;

use rr_scheduler::app::{cli, telemetry};
use rr_scheduler::worker::channel::ControllerClient;

#[derive(Parser, Debug)]
#[command(name = "shell", about = "Controller for the round-robin scheduler")]
struct ShellArgs {
    /// Fd to write requests to.
    request_fd: RawFd,
    /// Fd to read response codes from.
    response_fd: RawFd,
}

fn main() -> Result<()> {
    telemetry::init_logging();
    let args = ShellArgs::parse();
    ensure!(
        args.request_fd > 2 && args.response_fd > 2 && args.request_fd != args.response_fd,
        "bad controller fds {} {}",
        args.request_fd,
        args.response_fd
    );

    let client = unsafe { ControllerClient::from_raw_fds(args.request_fd, args.response_fd) };
    cli::run_shell(client)?;
    Ok(())
}
