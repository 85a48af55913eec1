//! Spawn Module
//!
//! Provides [`spawn`] and [`spawn_program`] over `posix_spawn(3)` and
//! `posix_spawnp(3)`, with the optional file actions and attributes passed
//! through [`SpawnSettings`].
//!
//! Building file actions and attributes only fails on resource exhaustion or
//! a bad argument, so those calls always raise. The spawn itself reports
//! through the caller's sink.

use std::fmt;

use libc::{c_char, c_int, pid_t};
use log::debug;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

use adapters_file_system::FileDescriptorLike;
use adapters_process_control::{ChildProcess, SignalSet};
use entities_c_strings::{CPath, CStringArray};
use entities_system_errors::{check_code, sink_try, ErrorSink, Result, SystemError, Throw};

#[cfg(any(all(target_os = "linux", target_env = "gnu"), target_vendor = "apple"))]
extern "C" {
    fn posix_spawn_file_actions_addchdir_np(
        actions: *mut libc::posix_spawn_file_actions_t,
        path: *const c_char,
    ) -> c_int;
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
extern "C" {
    fn posix_spawn_file_actions_addclosefrom_np(actions: *mut libc::posix_spawn_file_actions_t, from: c_int) -> c_int;
}

/// Descriptor operations performed in the child before the program starts
pub struct SpawnFileActions {
    // Boxed so the initialized object never moves
    inner: Box<libc::posix_spawn_file_actions_t>,
}

impl SpawnFileActions {
    pub fn new() -> Result<Self> {
        // SAFETY: zeroed storage is only handed to the initializer
        let mut inner: Box<libc::posix_spawn_file_actions_t> = Box::new(unsafe { std::mem::zeroed() });
        check_code(unsafe { libc::posix_spawn_file_actions_init(&mut *inner) }, || {
            "posix_spawn_file_actions_init failed".to_string()
        })?;
        Ok(Self { inner })
    }

    pub fn as_ptr(&self) -> *const libc::posix_spawn_file_actions_t {
        &*self.inner
    }

    /// Close `fd` in the child
    pub fn add_close<F: FileDescriptorLike>(&mut self, fd: F) -> Result<()> {
        let ret = unsafe { libc::posix_spawn_file_actions_addclose(&mut *self.inner, fd.c_fd()) };
        check_code(ret, || format!("posix_spawn_file_actions_addclose({}) failed", fd.c_fd()))
    }

    /// Open `path` as `fd` in the child
    pub fn add_open<F: FileDescriptorLike, P: CPath>(&mut self, fd: F, path: P, flags: OFlag, mode: Mode) -> Result<()> {
        let c_path = path.c_path()?;
        let ret = unsafe {
            libc::posix_spawn_file_actions_addopen(&mut *self.inner, fd.c_fd(), c_path.as_ptr(), flags.bits(), mode.bits())
        };
        check_code(ret, || {
            format!("posix_spawn_file_actions_addopen({}, {}) failed", fd.c_fd(), c_path.to_string_lossy())
        })
    }

    /// Duplicate `from` onto `to` in the child
    pub fn add_dup2<F: FileDescriptorLike, T: FileDescriptorLike>(&mut self, from: F, to: T) -> Result<()> {
        let ret = unsafe { libc::posix_spawn_file_actions_adddup2(&mut *self.inner, from.c_fd(), to.c_fd()) };
        check_code(ret, || {
            format!("posix_spawn_file_actions_adddup2({}, {}) failed", from.c_fd(), to.c_fd())
        })
    }

    /// Change the child's working directory to `path`
    #[cfg(any(all(target_os = "linux", target_env = "gnu"), target_vendor = "apple"))]
    pub fn add_chdir<P: CPath>(&mut self, path: P) -> Result<()> {
        let c_path = path.c_path()?;
        let ret = unsafe { posix_spawn_file_actions_addchdir_np(&mut *self.inner, c_path.as_ptr()) };
        check_code(ret, || {
            format!("posix_spawn_file_actions_addchdir_np({}) failed", c_path.to_string_lossy())
        })
    }

    /// Close every descriptor from `fd` upwards in the child
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    pub fn add_close_from<F: FileDescriptorLike>(&mut self, fd: F) -> Result<()> {
        let ret = unsafe { posix_spawn_file_actions_addclosefrom_np(&mut *self.inner, fd.c_fd()) };
        check_code(ret, || format!("posix_spawn_file_actions_addclosefrom_np({}) failed", fd.c_fd()))
    }
}

impl Drop for SpawnFileActions {
    fn drop(&mut self) {
        unsafe { libc::posix_spawn_file_actions_destroy(&mut *self.inner) };
    }
}

impl fmt::Debug for SpawnFileActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnFileActions").finish_non_exhaustive()
    }
}

/// Attributes of the spawned child
pub struct SpawnAttr {
    inner: Box<libc::posix_spawnattr_t>,
}

impl SpawnAttr {
    pub fn new() -> Result<Self> {
        // SAFETY: zeroed storage is only handed to the initializer
        let mut inner: Box<libc::posix_spawnattr_t> = Box::new(unsafe { std::mem::zeroed() });
        check_code(unsafe { libc::posix_spawnattr_init(&mut *inner) }, || {
            "posix_spawnattr_init failed".to_string()
        })?;
        Ok(Self { inner })
    }

    pub fn as_ptr(&self) -> *const libc::posix_spawnattr_t {
        &*self.inner
    }

    /// Set the `POSIX_SPAWN_*` flags
    ///
    /// Flags outside the range of `short` are rejected with `EINVAL`.
    pub fn set_flags(&mut self, flags: c_int) -> Result<()> {
        let Ok(short_flags) = libc::c_short::try_from(flags) else {
            return Throw.fail(SystemError::posix(libc::EINVAL), (), || {
                format!("posix_spawnattr_setflags(0x{:x}): flags do not fit in a short", flags)
            });
        };
        let ret = unsafe { libc::posix_spawnattr_setflags(&mut *self.inner, short_flags) };
        check_code(ret, || format!("posix_spawnattr_setflags(0x{:x}) failed", flags))
    }

    /// Signals reset to their default action, with `POSIX_SPAWN_SETSIGDEF`
    pub fn set_sig_default(&mut self, signals: &SignalSet) -> Result<()> {
        let ret = unsafe { libc::posix_spawnattr_setsigdefault(&mut *self.inner, signals.get()) };
        check_code(ret, || "posix_spawnattr_setsigdefault failed".to_string())
    }

    /// Signal mask of the child, with `POSIX_SPAWN_SETSIGMASK`
    pub fn set_sig_mask(&mut self, signals: &SignalSet) -> Result<()> {
        let ret = unsafe { libc::posix_spawnattr_setsigmask(&mut *self.inner, signals.get()) };
        check_code(ret, || "posix_spawnattr_setsigmask failed".to_string())
    }

    /// Process group of the child, with `POSIX_SPAWN_SETPGROUP`; `0` makes
    /// the child a group leader
    pub fn set_pgroup(&mut self, pgroup: pid_t) -> Result<()> {
        let ret = unsafe { libc::posix_spawnattr_setpgroup(&mut *self.inner, pgroup) };
        check_code(ret, || format!("posix_spawnattr_setpgroup({}) failed", pgroup))
    }
}

impl Drop for SpawnAttr {
    fn drop(&mut self) {
        unsafe { libc::posix_spawnattr_destroy(&mut *self.inner) };
    }
}

impl fmt::Debug for SpawnAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnAttr").finish_non_exhaustive()
    }
}

/// Optional parts of a spawn
///
/// The settings borrow the file actions and attributes, which must outlive
/// the spawn call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnSettings<'a> {
    file_actions: Option<&'a SpawnFileActions>,
    attr: Option<&'a SpawnAttr>,
    use_path: bool,
}

impl<'a> SpawnSettings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_actions(mut self, actions: &'a SpawnFileActions) -> Self {
        self.file_actions = Some(actions);
        self
    }

    pub fn attr(mut self, attr: &'a SpawnAttr) -> Self {
        self.attr = Some(attr);
        self
    }

    /// Search `PATH` for the executable, with `posix_spawnp(3)`
    pub fn use_path(mut self) -> Self {
        self.use_path = true;
        self
    }
}

/// Spawn the program named by `args[0]`
///
/// An empty `args` reports `EINVAL`.
pub fn spawn<S: ErrorSink>(
    args: &CStringArray<'_>,
    env: Option<&CStringArray<'_>>,
    settings: &SpawnSettings<'_>,
    sink: S,
) -> S::Output<ChildProcess> {
    let exe = match args.get(0) {
        Some(exe) => exe,
        None => {
            return sink.fail(SystemError::posix(libc::EINVAL), ChildProcess::default(), || {
                "cannot spawn without arguments".to_string()
            });
        }
    };
    spawn_program(exe, args, env, settings, sink)
}

/// Spawn `exe` with the given argument vector
///
/// # Arguments
///
/// * `exe` - Path of the program, or its name when the settings search `PATH`
/// * `args` - Argument vector, program name included
/// * `env` - Environment of the child; `None` copies the caller's
/// * `settings` - File actions, attributes and path search
/// * `sink` - Error sink
///
/// # Returns
///
/// The bound child, or an empty wrapper if the spawn failed and the sink
/// records instead of raising.
pub fn spawn_program<P: CPath, S: ErrorSink>(
    exe: P,
    args: &CStringArray<'_>,
    env: Option<&CStringArray<'_>>,
    settings: &SpawnSettings<'_>,
    sink: S,
) -> S::Output<ChildProcess> {
    let path = sink_try!(sink, exe.c_path(), ChildProcess::default(), "cannot spawn path containing NUL");
    let inherited;
    let env = match env {
        Some(env) => env,
        None => {
            inherited = sink_try!(
                sink,
                CStringArray::environment(),
                ChildProcess::default(),
                "cannot copy the environment for {}",
                path.to_string_lossy()
            );
            &inherited
        }
    };
    let func = if settings.use_path { libc::posix_spawnp } else { libc::posix_spawn };
    let actions = settings.file_actions.map_or(std::ptr::null(), SpawnFileActions::as_ptr);
    let attr = settings.attr.map_or(std::ptr::null(), SpawnAttr::as_ptr);
    let mut pid: pid_t = 0;
    let ret = unsafe {
        func(
            &mut pid,
            path.as_ptr(),
            actions,
            attr,
            args.as_ptr() as *const *mut c_char,
            env.as_ptr() as *const *mut c_char,
        )
    };
    if ret != 0 {
        return sink.fail(SystemError::posix(ret), ChildProcess::default(), || {
            format!("cannot spawn {}", path.to_string_lossy())
        });
    }
    debug!("spawned {} as process {}", path.to_string_lossy(), pid);
    sink.succeed(ChildProcess::from_raw(pid))
}
