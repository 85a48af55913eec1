//! Exec Module
//!
//! Provides [`fork_process`] and the `exec*` family. The exec calls replace
//! the calling process image, so they only return on failure.

use std::ffi::CStr;

use libc::c_char;
use log::debug;

use adapters_process_control::ChildProcess;
use entities_c_strings::{CPath, CStringArray};
use entities_system_errors::{sink_try, ErrorSink, SystemError};

#[cfg(all(target_os = "linux", target_env = "gnu"))]
extern "C" {
    fn execvpe(file: *const c_char, argv: *const *const c_char, envp: *const *const c_char) -> libc::c_int;
}

/// Fork the calling process with `fork(2)`
///
/// The parent receives the bound child; the child receives an empty
/// wrapper.
///
/// # Safety
///
/// In a multithreaded parent the child may only call async-signal-safe
/// functions until it execs or exits.
pub unsafe fn fork_process<S: ErrorSink>(sink: S) -> S::Output<ChildProcess> {
    let pid = libc::fork();
    if pid < 0 {
        return sink.fail(SystemError::last(), ChildProcess::default(), || "fork() failed".to_string());
    }
    if pid > 0 {
        debug!("forked process {}", pid);
    }
    sink.succeed(ChildProcess::from_raw(pid))
}

fn program_name<'a>(args: &'a CStringArray<'_>) -> Result<&'a CStr, SystemError> {
    args.get(0).ok_or(SystemError::posix(libc::EINVAL))
}

/// Replace the process image with the program named by `args[0]`
pub fn exec<S: ErrorSink>(args: &CStringArray<'_>, env: Option<&CStringArray<'_>>, sink: S) -> S::Output<()> {
    let exe = sink_try!(sink, program_name(args), (), "cannot exec without arguments");
    exec_program(exe, args, env, sink)
}

/// Replace the process image with `exe`, via `execv(2)` or `execve(2)`
///
/// `None` as the environment keeps the caller's.
pub fn exec_program<P: CPath, S: ErrorSink>(
    exe: P,
    args: &CStringArray<'_>,
    env: Option<&CStringArray<'_>>,
    sink: S,
) -> S::Output<()> {
    let path = sink_try!(sink, exe.c_path(), (), "cannot exec path containing NUL");
    unsafe {
        match env {
            Some(env) => libc::execve(path.as_ptr(), args.as_ptr(), env.as_ptr()),
            None => libc::execv(path.as_ptr(), args.as_ptr()),
        };
    }
    sink.fail(SystemError::last(), (), || format!("cannot exec {}", path.to_string_lossy()))
}

/// Like [`exec`], searching `PATH` for `args[0]`
pub fn exec_search<S: ErrorSink>(args: &CStringArray<'_>, env: Option<&CStringArray<'_>>, sink: S) -> S::Output<()> {
    let exe = sink_try!(sink, program_name(args), (), "cannot exec without arguments");
    exec_search_program(exe, args, env, sink)
}

/// Like [`exec_program`], searching `PATH` for `exe`, via `execvp(3)` or
/// `execvpe(3)`
///
/// Where the system has no `execvpe`, passing an environment reports
/// `ENOSYS`.
pub fn exec_search_program<P: CPath, S: ErrorSink>(
    exe: P,
    args: &CStringArray<'_>,
    env: Option<&CStringArray<'_>>,
    sink: S,
) -> S::Output<()> {
    let path = sink_try!(sink, exe.c_path(), (), "cannot exec path containing NUL");
    match env {
        None => unsafe {
            libc::execvp(path.as_ptr(), args.as_ptr());
        },
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        Some(env) => unsafe {
            execvpe(path.as_ptr(), args.as_ptr(), env.as_ptr());
        },
        #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
        Some(_) => {
            return sink.fail(SystemError::posix(libc::ENOSYS), (), || {
                format!("cannot exec {} with an environment: no execvpe", path.to_string_lossy())
            });
        }
    }
    sink.fail(SystemError::last(), (), || format!("cannot exec {}", path.to_string_lossy()))
}
