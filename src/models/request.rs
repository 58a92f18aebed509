//! Fixed-size wire format of the controller channel.
//!
//! A request is `kind: i32`, `task_arg: i32` and a NUL-padded path of
//! [`EXEC_ARG_LEN`] bytes, integers in native byte order. The response is a
//! single native `i32`.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use crate::error::{Result, SchedulerError};

pub const EXEC_ARG_LEN: usize = 120;
pub const REQUEST_SIZE: usize = 8 + EXEC_ARG_LEN;
pub const RESPONSE_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    ListTasks,
    KillTask,
    SpawnTask,
    Unknown(i32),
}

impl RequestKind {
    fn code(self) -> i32 {
        match self {
            RequestKind::ListTasks => 0,
            RequestKind::KillTask => 1,
            RequestKind::SpawnTask => 2,
            RequestKind::Unknown(code) => code,
        }
    }

    fn from_code(code: i32) -> Self {
        match code {
            0 => RequestKind::ListTasks,
            1 => RequestKind::KillTask,
            2 => RequestKind::SpawnTask,
            other => RequestKind::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: RequestKind,
    pub task_arg: i32,
    pub exec_arg: PathBuf,
}

impl Request {
    pub fn list_tasks() -> Self {
        Self {
            kind: RequestKind::ListTasks,
            task_arg: 0,
            exec_arg: PathBuf::new(),
        }
    }

    pub fn kill_task(id: i32) -> Self {
        Self {
            kind: RequestKind::KillTask,
            task_arg: id,
            exec_arg: PathBuf::new(),
        }
    }

    pub fn spawn_task(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: RequestKind::SpawnTask,
            task_arg: 0,
            exec_arg: path.into(),
        }
    }

    // The path needs room for its terminating NUL.
    pub fn encode(&self) -> Result<[u8; REQUEST_SIZE]> {
        let path = self.exec_arg.as_os_str().as_bytes();
        if path.len() >= EXEC_ARG_LEN || path.contains(&0) {
            return Err(SchedulerError::InvalidPath(self.exec_arg.display().to_string()));
        }

        let mut buf = [0u8; REQUEST_SIZE];
        buf[0..4].copy_from_slice(&self.kind.code().to_ne_bytes());
        buf[4..8].copy_from_slice(&self.task_arg.to_ne_bytes());
        buf[8..8 + path.len()].copy_from_slice(path);
        Ok(buf)
    }

    pub fn decode(buf: &[u8; REQUEST_SIZE]) -> Self {
        let kind = i32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let task_arg = i32::from_ne_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let raw = &buf[8..];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());

        Self {
            kind: RequestKind::from_code(kind),
            task_arg,
            exec_arg: PathBuf::from(OsStr::from_bytes(&raw[..end])),
        }
    }
}

pub fn encode_response(code: i32) -> [u8; RESPONSE_SIZE] {
    code.to_ne_bytes()
}

pub fn decode_response(buf: [u8; RESPONSE_SIZE]) -> i32 {
    i32::from_ne_bytes(buf)
}
