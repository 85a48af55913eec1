//! Child Process Module
//!
//! Provides [`ChildProcess`], the owning wrapper of a child process id.
//!
//! A bound wrapper must eventually reap its child: either [`ChildProcess::wait`]
//! observes termination, or dropping the wrapper blocks until the child exits.
//! The wrapper becomes empty (pid `0`) only once the child is known to have
//! exited or been killed; a stopped or continued child stays bound.

use std::process::Child;

use libc::pid_t;
use log::{trace, warn};
use nix::sys::wait::{WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use entities_system_errors::{ErrorSink, SystemError};

/// Value that can be passed where a process id is expected
pub trait ProcessLike {
    fn c_pid(&self) -> pid_t;
}

/// Raw status word reported by `waitpid(2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus(pub libc::c_int);

impl ProcessStatus {
    pub fn raw(&self) -> libc::c_int {
        self.0
    }

    /// True if the child exited normally
    pub fn exited(&self) -> bool {
        libc::WIFEXITED(self.0)
    }

    /// Exit code, if the child exited normally
    pub fn exit_code(&self) -> Option<i32> {
        self.exited().then(|| libc::WEXITSTATUS(self.0))
    }

    /// True if the child was terminated by a signal
    pub fn signaled(&self) -> bool {
        libc::WIFSIGNALED(self.0)
    }

    /// Terminating signal, if the child was killed
    pub fn signal(&self) -> Option<i32> {
        self.signaled().then(|| libc::WTERMSIG(self.0))
    }

    pub fn stopped(&self) -> bool {
        libc::WIFSTOPPED(self.0)
    }

    /// Signal that stopped the child, if it is stopped
    pub fn stop_signal(&self) -> Option<i32> {
        self.stopped().then(|| libc::WSTOPSIG(self.0))
    }

    pub fn continued(&self) -> bool {
        libc::WIFCONTINUED(self.0)
    }

    /// True once the child can no longer be waited for
    pub fn terminated(&self) -> bool {
        self.exited() || self.signaled()
    }

    /// Decode into nix's `WaitStatus` for the given child
    pub fn to_wait_status(&self, pid: Pid) -> Result<WaitStatus, SystemError> {
        WaitStatus::from_raw(pid, self.0).map_err(SystemError::from)
    }
}

/// Owning wrapper of a child process id
#[derive(Debug, Default)]
pub struct ChildProcess {
    pid: pid_t,
}

impl ChildProcess {
    /// Take ownership of the child `pid`; `0` produces an empty wrapper
    pub fn from_raw(pid: pid_t) -> Self {
        Self { pid }
    }

    /// Raw process id, `0` if empty
    pub fn get(&self) -> pid_t {
        self.pid
    }

    pub fn pid(&self) -> Option<Pid> {
        self.is_valid().then(|| Pid::from_raw(self.pid))
    }

    pub fn is_valid(&self) -> bool {
        self.pid != 0
    }

    /// Give up ownership without reaping
    pub fn release(&mut self) -> pid_t {
        std::mem::replace(&mut self.pid, 0)
    }

    /// Wait for a state change with `waitpid(2)`
    ///
    /// # Arguments
    ///
    /// * `flags` - `WNOHANG`, `WUNTRACED`, `WCONTINUED` or empty to block
    /// * `sink` - Error sink
    ///
    /// # Returns
    ///
    /// * `Some(status)` - The child changed state
    /// * `None` - `WNOHANG` was given and the child is still running, or the
    ///   call failed and the sink records instead of raising
    ///
    /// Waiting on an empty wrapper reports `EINVAL`.
    pub fn wait<S: ErrorSink>(&mut self, flags: WaitPidFlag, sink: S) -> S::Output<Option<ProcessStatus>> {
        if self.pid == 0 {
            return sink.fail(SystemError::posix(libc::EINVAL), None, || {
                "ChildProcess not started or has already been waited for".to_string()
            });
        }
        let mut status: libc::c_int = 0;
        let ret = unsafe { libc::waitpid(self.pid, &mut status, flags.bits()) };
        if ret < 0 {
            let pid = self.pid;
            return sink.fail(SystemError::last(), None, || format!("waitpid for {} failed", pid));
        }
        if ret == 0 {
            return sink.succeed(None);
        }
        let status = ProcessStatus(status);
        if status.terminated() {
            trace!("child {} reaped with status 0x{:x}", self.pid, status.raw());
            self.pid = 0;
        }
        sink.succeed(Some(status))
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        if self.pid == 0 {
            return;
        }
        let mut status: libc::c_int = 0;
        loop {
            let ret = unsafe { libc::waitpid(self.pid, &mut status, 0) };
            if ret >= 0 {
                break;
            }
            let err = SystemError::last();
            if err.matches(libc::EINTR) {
                trace!("reaping child {} interrupted, retrying", self.pid);
                continue;
            }
            warn!("failed to reap child {}: {}", self.pid, err);
            break;
        }
    }
}

impl ProcessLike for pid_t {
    fn c_pid(&self) -> pid_t {
        *self
    }
}

impl ProcessLike for Pid {
    fn c_pid(&self) -> pid_t {
        self.as_raw()
    }
}

impl ProcessLike for ChildProcess {
    fn c_pid(&self) -> pid_t {
        self.pid
    }
}

impl ProcessLike for Child {
    fn c_pid(&self) -> pid_t {
        self.id() as pid_t
    }
}

impl<T: ProcessLike + ?Sized> ProcessLike for &T {
    fn c_pid(&self) -> pid_t {
        (**self).c_pid()
    }
}

impl<T: ProcessLike + ?Sized> ProcessLike for &mut T {
    fn c_pid(&self) -> pid_t {
        (**self).c_pid()
    }
}
