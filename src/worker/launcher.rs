//! The child stops itself with SIGSTOP before exec, so it cannot run its
//! program until the scheduler sends SIGCONT. Only async-signal-safe calls
//! happen between fork and exec.

use std::ffi::CString;
use std::io;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::{mem, ptr};

use log::{debug, info};
use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult};

use crate::error::{Result, SchedulerError};
use crate::models::task::Pid;

const EXEC_FAILED: &[u8] = b"scheduler: child: execv failed\n";

/// `inherit_fds` lose close-on-exec in the child so the program receives
/// them.
pub fn launch(path: &Path, args: &[String], inherit_fds: &[RawFd]) -> Result<Pid> {
    let invalid = || SchedulerError::InvalidPath(path.display().to_string());
    let program = CString::new(path.as_os_str().as_bytes()).map_err(|_| invalid())?;

    let mut owned = vec![program.clone()];
    for arg in args {
        owned.push(CString::new(arg.as_str()).map_err(|_| invalid())?);
    }
    let mut argv: Vec<*const libc::c_char> = owned.iter().map(|a| a.as_ptr()).collect();
    argv.push(ptr::null());

    match unsafe { unistd::fork() } {
        Err(e) => Err(SchedulerError::Launch {
            path: path.to_path_buf(),
            source: io::Error::from(e),
        }),
        Ok(ForkResult::Child) => unsafe { exec_paused(&program, &argv, inherit_fds) },
        Ok(ForkResult::Parent { child }) => {
            info!("Forked {} as pid {}", path.display(), child);
            Ok(child.as_raw())
        }
    }
}

/// Blocks until `pid` reports the stop it raised before exec.
pub fn await_paused(pid: Pid) -> Result<()> {
    let status = loop {
        match wait::waitpid(unistd::Pid::from_raw(pid), Some(WaitPidFlag::WUNTRACED)) {
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(SchedulerError::Wait(io::Error::from(e))),
            Ok(status) => break status,
        }
    };

    match status {
        WaitStatus::Stopped(..) => {
            debug!("pid {} is paused and ready", pid);
            Ok(())
        }
        _ => Err(SchedulerError::UnexpectedStatus { pid }),
    }
}

unsafe fn exec_paused(program: &CString, argv: &[*const libc::c_char], inherit_fds: &[RawFd]) -> ! {
    // The scheduler blocks SIGCHLD and ignores SIGPIPE; neither should leak
    // into the worker.
    let mut empty: libc::sigset_t = mem::zeroed();
    libc::sigemptyset(&mut empty);
    libc::pthread_sigmask(libc::SIG_SETMASK, &empty, ptr::null_mut());
    libc::signal(libc::SIGPIPE, libc::SIG_DFL);

    for &fd in inherit_fds {
        libc::fcntl(fd, libc::F_SETFD, 0);
    }

    libc::raise(libc::SIGSTOP);
    libc::execv(program.as_ptr(), argv.as_ptr());

    libc::write(2, EXEC_FAILED.as_ptr().cast(), EXEC_FAILED.len());
    libc::_exit(127)
}
