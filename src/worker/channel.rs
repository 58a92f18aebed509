use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use log::{debug, warn};
use nix::fcntl::OFlag;
use nix::unistd;

use crate::error::{Result, SchedulerError};
use crate::models::message::SchedulerEvent;
use crate::models::request::{self, Request, REQUEST_SIZE, RESPONSE_SIZE};

#[derive(Debug)]
pub struct ControllerChannel {
    requests: File,
    responses: File,
}

// Only held until the controller has been forked.
#[derive(Debug)]
pub struct ControllerEnds {
    request_write: OwnedFd,
    response_read: OwnedFd,
}

impl ControllerEnds {
    pub fn raw_fds(&self) -> [RawFd; 2] {
        [self.request_write.as_raw_fd(), self.response_read.as_raw_fd()]
    }

    pub fn as_args(&self) -> Vec<String> {
        self.raw_fds().iter().map(|fd| format!("{:05}", fd)).collect()
    }
}

fn pipe_cloexec() -> Result<(OwnedFd, OwnedFd)> {
    unistd::pipe2(OFlag::O_CLOEXEC).map_err(|e| SchedulerError::Channel(io::Error::from(e)))
}

pub fn open_controller_channel() -> Result<(ControllerChannel, ControllerEnds)> {
    let (request_read, request_write) = pipe_cloexec()?;
    let (response_read, response_write) = pipe_cloexec()?;

    let channel = ControllerChannel {
        requests: File::from(request_read),
        responses: File::from(response_write),
    };
    let ends = ControllerEnds {
        request_write,
        response_read,
    };
    Ok((channel, ends))
}

/// One request is in flight at a time. Any short read or write ends the
/// thread with [`SchedulerEvent::ControllerGone`].
pub fn spawn_command_reader(
    channel: ControllerChannel,
    sender: Sender<SchedulerEvent>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("controller-reader".into())
        .spawn(move || serve_controller(channel, sender))
        .map_err(SchedulerError::Channel)
}

fn serve_controller(mut channel: ControllerChannel, sender: Sender<SchedulerEvent>) {
    loop {
        let mut buf = [0u8; REQUEST_SIZE];
        if let Err(e) = channel.requests.read_exact(&mut buf) {
            warn!("Read from controller failed: {}", e);
            break;
        }

        let rq = Request::decode(&buf);
        debug!("Controller request: {:?}", rq);
        let (reply_tx, reply_rx) = bounded(1);
        if sender.send(SchedulerEvent::Command(rq, reply_tx)).is_err() {
            return;
        }
        let Ok(code) = reply_rx.recv() else {
            return;
        };

        if let Err(e) = channel.responses.write_all(&request::encode_response(code)) {
            warn!("Write to controller failed: {}", e);
            break;
        }
    }

    warn!("Giving up on controller request processing");
    let _ = sender.send(SchedulerEvent::ControllerGone);
}

#[derive(Debug)]
pub struct ControllerClient {
    requests: File,
    responses: File,
}

impl ControllerClient {
    /// Takes ownership of fds inherited from the scheduler.
    ///
    /// # Safety
    /// Both fds must be open and owned by nobody else in this process.
    pub unsafe fn from_raw_fds(request_fd: RawFd, response_fd: RawFd) -> Self {
        Self {
            requests: File::from_raw_fd(request_fd),
            responses: File::from_raw_fd(response_fd),
        }
    }

    pub fn send(&mut self, rq: &Request) -> Result<i32> {
        let buf = rq.encode()?;
        self.requests.write_all(&buf).map_err(SchedulerError::Channel)?;

        let mut reply = [0u8; RESPONSE_SIZE];
        self.responses
            .read_exact(&mut reply)
            .map_err(SchedulerError::Channel)?;
        Ok(request::decode_response(reply))
    }
}
