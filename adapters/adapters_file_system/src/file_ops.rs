//! File Operations Module
//!
//! Provides the operations acting on files through a path or a descriptor:
//! ownership and permission changes, status queries, directory creation,
//! truncation, advisory locking and working/root directory changes.
//!
//! Path arguments accept anything implementing [`CPath`]; descriptor
//! arguments accept anything implementing [`FileDescriptorLike`].

use std::mem;

use nix::sys::stat::Mode;
use nix::unistd::{Gid, Uid};

use entities_c_strings::CPath;
use entities_system_errors::{sink_try, ErrorSink, SystemError};

use crate::descriptor::FileDescriptorLike;

#[cfg(any(target_vendor = "apple", target_os = "freebsd", target_os = "netbsd"))]
extern "C" {
    fn lchmod(path: *const libc::c_char, mode: libc::mode_t) -> libc::c_int;
}

/// Operation requested from `flock(2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOperation {
    Shared,
    Exclusive,
    Unlock,
    SharedNonblock,
    ExclusiveNonblock,
    UnlockNonblock,
}

impl LockOperation {
    pub fn bits(self) -> libc::c_int {
        match self {
            LockOperation::Shared => libc::LOCK_SH,
            LockOperation::Exclusive => libc::LOCK_EX,
            LockOperation::Unlock => libc::LOCK_UN,
            LockOperation::SharedNonblock => libc::LOCK_SH | libc::LOCK_NB,
            LockOperation::ExclusiveNonblock => libc::LOCK_EX | libc::LOCK_NB,
            LockOperation::UnlockNonblock => libc::LOCK_UN | libc::LOCK_NB,
        }
    }
}

fn raw_uid(uid: Option<Uid>) -> libc::uid_t {
    uid.map_or(libc::uid_t::MAX, |u| u.as_raw())
}

fn raw_gid(gid: Option<Gid>) -> libc::gid_t {
    gid.map_or(libc::gid_t::MAX, |g| g.as_raw())
}

// Owner ids are shown as the signed values callers pass, so "unchanged" reads as -1
fn id_text(raw: u32) -> i64 {
    if raw == u32::MAX {
        -1
    } else {
        i64::from(raw)
    }
}

fn empty_stat() -> libc::stat {
    // SAFETY: `stat` is plain data; all-zero is a valid value
    unsafe { mem::zeroed() }
}

/// Change the owner of an open file with `fchown(2)`
///
/// `None` leaves the corresponding id unchanged.
pub fn change_owner<F, S>(fd: F, uid: Option<Uid>, gid: Option<Gid>, sink: S) -> S::Output<()>
where
    F: FileDescriptorLike,
    S: ErrorSink,
{
    let fd = fd.c_fd();
    let (uid, gid) = (raw_uid(uid), raw_gid(gid));
    let ret = unsafe { libc::fchown(fd, uid, gid) };
    sink.from_status(ret, || format!("fchown({}, {}, {}) failed", fd, id_text(uid), id_text(gid)))
}

/// Change the owner of a file with `chown(2)`, following symbolic links
pub fn change_path_owner<P, S>(path: P, uid: Option<Uid>, gid: Option<Gid>, sink: S) -> S::Output<()>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), (), "chown: path contains NUL");
    let (uid, gid) = (raw_uid(uid), raw_gid(gid));
    let ret = unsafe { libc::chown(c_path.as_ptr(), uid, gid) };
    sink.from_status(ret, || {
        format!("chown({}, {}, {}) failed", c_path.to_string_lossy(), id_text(uid), id_text(gid))
    })
}

/// Change the owner of a symbolic link itself with `lchown(2)`
pub fn change_link_owner<P, S>(path: P, uid: Option<Uid>, gid: Option<Gid>, sink: S) -> S::Output<()>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), (), "lchown: path contains NUL");
    let (uid, gid) = (raw_uid(uid), raw_gid(gid));
    let ret = unsafe { libc::lchown(c_path.as_ptr(), uid, gid) };
    sink.from_status(ret, || {
        format!("lchown({}, {}, {}) failed", c_path.to_string_lossy(), id_text(uid), id_text(gid))
    })
}

/// Change the permissions of an open file with `fchmod(2)`
pub fn change_mode<F, S>(fd: F, mode: Mode, sink: S) -> S::Output<()>
where
    F: FileDescriptorLike,
    S: ErrorSink,
{
    let fd = fd.c_fd();
    let ret = unsafe { libc::fchmod(fd, mode.bits()) };
    sink.from_status(ret, || format!("fchmod({}, 0{:o}) failed", fd, mode.bits()))
}

/// Change the permissions of a file with `chmod(2)`
pub fn change_path_mode<P, S>(path: P, mode: Mode, sink: S) -> S::Output<()>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), (), "chmod: path contains NUL");
    let ret = unsafe { libc::chmod(c_path.as_ptr(), mode.bits()) };
    sink.from_status(ret, || {
        format!("chmod({}, 0{:o}) failed", c_path.to_string_lossy(), mode.bits())
    })
}

/// Change the permissions of a symbolic link itself with `lchmod(2)`
#[cfg(any(target_vendor = "apple", target_os = "freebsd", target_os = "netbsd"))]
pub fn change_link_mode<P, S>(path: P, mode: Mode, sink: S) -> S::Output<()>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), (), "lchmod: path contains NUL");
    let ret = unsafe { lchmod(c_path.as_ptr(), mode.bits()) };
    sink.from_status(ret, || {
        format!("lchmod({}, 0{:o}) failed", c_path.to_string_lossy(), mode.bits())
    })
}

/// Status of an open file, from `fstat(2)`
pub fn get_status<F, S>(fd: F, sink: S) -> S::Output<libc::stat>
where
    F: FileDescriptorLike,
    S: ErrorSink,
{
    let fd = fd.c_fd();
    let mut status = empty_stat();
    if unsafe { libc::fstat(fd, &mut status) } != 0 {
        return sink.fail(SystemError::last(), empty_stat(), || {
            format!("fstat({}) failed", fd)
        });
    }
    sink.succeed(status)
}

/// Status of a file, from `stat(2)`, following symbolic links
pub fn get_path_status<P, S>(path: P, sink: S) -> S::Output<libc::stat>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), empty_stat(), "stat: path contains NUL");
    let mut status = empty_stat();
    if unsafe { libc::stat(c_path.as_ptr(), &mut status) } != 0 {
        return sink.fail(SystemError::last(), empty_stat(), || {
            format!("stat({}) failed", c_path.to_string_lossy())
        });
    }
    sink.succeed(status)
}

/// Status of a symbolic link itself, from `lstat(2)`
pub fn get_link_status<P, S>(path: P, sink: S) -> S::Output<libc::stat>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), empty_stat(), "lstat: path contains NUL");
    let mut status = empty_stat();
    if unsafe { libc::lstat(c_path.as_ptr(), &mut status) } != 0 {
        return sink.fail(SystemError::last(), empty_stat(), || {
            format!("lstat({}) failed", c_path.to_string_lossy())
        });
    }
    sink.succeed(status)
}

/// Create a directory with `mkdir(2)`
pub fn make_directory<P, S>(path: P, mode: Mode, sink: S) -> S::Output<()>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), (), "mkdir: path contains NUL");
    let ret = unsafe { libc::mkdir(c_path.as_ptr(), mode.bits()) };
    sink.from_status(ret, || {
        format!("mkdir({}, 0{:o}) failed", c_path.to_string_lossy(), mode.bits())
    })
}

/// Create a directory relative to the directory `dir_fd` with `mkdirat(2)`
pub fn make_directory_at<F, P, S>(dir_fd: F, path: P, mode: Mode, sink: S) -> S::Output<()>
where
    F: FileDescriptorLike,
    P: CPath,
    S: ErrorSink,
{
    let fd = dir_fd.c_fd();
    let c_path = sink_try!(sink, path.c_path(), (), "mkdirat: path contains NUL");
    let ret = unsafe { libc::mkdirat(fd, c_path.as_ptr(), mode.bits()) };
    sink.from_status(ret, || {
        format!("mkdirat({}, {}, 0{:o}) failed", fd, c_path.to_string_lossy(), mode.bits())
    })
}

/// Set the length of an open file with `ftruncate(2)`
pub fn truncate_file<F, S>(fd: F, len: libc::off_t, sink: S) -> S::Output<()>
where
    F: FileDescriptorLike,
    S: ErrorSink,
{
    let fd = fd.c_fd();
    let ret = unsafe { libc::ftruncate(fd, len) };
    sink.from_status(ret, || format!("ftruncate({}, {}) failed", fd, len))
}

/// Set the length of a file with `truncate(2)`
pub fn truncate_path<P, S>(path: P, len: libc::off_t, sink: S) -> S::Output<()>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), (), "truncate: path contains NUL");
    let ret = unsafe { libc::truncate(c_path.as_ptr(), len) };
    sink.from_status(ret, || format!("truncate({}, {}) failed", c_path.to_string_lossy(), len))
}

/// Apply or remove an advisory lock with `flock(2)`
///
/// The non-blocking operations report `EWOULDBLOCK` when the lock is held
/// elsewhere.
pub fn lock_file<F, S>(fd: F, operation: LockOperation, sink: S) -> S::Output<()>
where
    F: FileDescriptorLike,
    S: ErrorSink,
{
    let fd = fd.c_fd();
    let ret = unsafe { libc::flock(fd, operation.bits()) };
    sink.from_status(ret, || format!("flock({}, {:?}) failed", fd, operation))
}

/// Change the working directory with `chdir(2)`
pub fn change_directory<P, S>(path: P, sink: S) -> S::Output<()>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), (), "chdir: path contains NUL");
    let ret = unsafe { libc::chdir(c_path.as_ptr()) };
    sink.from_status(ret, || format!("chdir({}) failed", c_path.to_string_lossy()))
}

/// Change the working directory to the open directory `fd` with `fchdir(2)`
pub fn change_directory_to<F, S>(fd: F, sink: S) -> S::Output<()>
where
    F: FileDescriptorLike,
    S: ErrorSink,
{
    let fd = fd.c_fd();
    let ret = unsafe { libc::fchdir(fd) };
    sink.from_status(ret, || format!("fchdir({}) failed", fd))
}

/// Change the root directory with `chroot(2)`
pub fn change_root<P, S>(path: P, sink: S) -> S::Output<()>
where
    P: CPath,
    S: ErrorSink,
{
    let c_path = sink_try!(sink, path.c_path(), (), "chroot: path contains NUL");
    let ret = unsafe { libc::chroot(c_path.as_ptr()) };
    sink.from_status(ret, || format!("chroot({}) failed", c_path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FileDescriptor;
    use entities_system_errors::{ErrorCode, Throw};
    use nix::fcntl::OFlag;

    fn create(path: &std::path::Path) -> FileDescriptor {
        FileDescriptor::open(path, OFlag::O_RDWR | OFlag::O_CREAT, Mode::from_bits_truncate(0o644), Throw).unwrap()
    }

    #[test]
    fn test_change_mode_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file");
        let fd = create(&path);

        change_mode(&fd, Mode::from_bits_truncate(0o600), Throw).unwrap();
        let status = get_status(&fd, Throw).unwrap();
        assert_eq!(status.st_mode & 0o777, 0o600);

        change_path_mode(&path, Mode::from_bits_truncate(0o640), Throw).unwrap();
        let status = get_path_status(&path, Throw).unwrap();
        assert_eq!(status.st_mode & 0o777, 0o640);
    }

    #[test]
    fn test_status_of_missing_path() {
        let err = get_path_status("/nonexistent/ptl", Throw).unwrap_err();
        assert!(err.matches(libc::ENOENT));
        assert_eq!(err.message(), Some("stat(/nonexistent/ptl) failed"));

        let mut ec = ErrorCode::new();
        let status = get_link_status("/nonexistent/ptl", &mut ec);
        assert!(ec.matches(libc::ENOENT));
        assert_eq!(status.st_size, 0);
    }

    #[test]
    fn test_mode_message_is_octal() {
        let err = change_path_mode("/nonexistent/ptl", Mode::from_bits_truncate(0o755), Throw).unwrap_err();
        assert_eq!(err.message(), Some("chmod(/nonexistent/ptl, 0755) failed"));
    }

    #[test]
    fn test_link_status_sees_link() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        drop(create(&target));
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let status = get_link_status(&link, Throw).unwrap();
        assert_eq!(status.st_mode & libc::S_IFMT, libc::S_IFLNK);
        let status = get_path_status(&link, Throw).unwrap();
        assert_eq!(status.st_mode & libc::S_IFMT, libc::S_IFREG);
    }

    #[test]
    fn test_change_owner_to_self() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owned");
        let fd = create(&path);
        let uid = Uid::effective();
        let gid = Gid::effective();

        change_owner(&fd, Some(uid), Some(gid), Throw).unwrap();
        change_path_owner(&path, None, Some(gid), Throw).unwrap();
        change_link_owner(&path, Some(uid), None, Throw).unwrap();
        let status = get_status(&fd, Throw).unwrap();
        assert_eq!(status.st_uid, uid.as_raw());
    }

    #[test]
    fn test_make_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        make_directory(&sub, Mode::from_bits_truncate(0o755), Throw).unwrap();
        assert!(sub.is_dir());

        let err = make_directory(&sub, Mode::from_bits_truncate(0o755), Throw).unwrap_err();
        assert!(err.matches(libc::EEXIST));

        let dir_fd = FileDescriptor::open(dir.path(), OFlag::O_RDONLY | OFlag::O_DIRECTORY, Mode::empty(), Throw).unwrap();
        make_directory_at(&dir_fd, "nested", Mode::from_bits_truncate(0o700), Throw).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sized");
        let fd = create(&path);
        truncate_file(&fd, 100, Throw).unwrap();
        assert_eq!(get_status(&fd, Throw).unwrap().st_size, 100);
        truncate_path(&path, 10, Throw).unwrap();
        assert_eq!(get_path_status(&path, Throw).unwrap().st_size, 10);
    }

    #[test]
    fn test_lock_file_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked");
        let first = create(&path);
        let second = FileDescriptor::open(&path, OFlag::O_RDWR, Mode::empty(), Throw).unwrap();

        lock_file(&first, LockOperation::Exclusive, Throw).unwrap();
        let mut ec = ErrorCode::new();
        lock_file(&second, LockOperation::ExclusiveNonblock, &mut ec);
        assert!(ec.matches(libc::EWOULDBLOCK));

        lock_file(&first, LockOperation::Unlock, Throw).unwrap();
        lock_file(&second, LockOperation::SharedNonblock, Throw).unwrap();
    }

    #[test]
    fn test_change_directory_errors() {
        let mut ec = ErrorCode::new();
        change_directory("/nonexistent/ptl", &mut ec);
        assert!(ec.matches(libc::ENOENT));
        change_directory_to(-1, &mut ec);
        assert!(ec.matches(libc::EBADF));
    }

    #[test]
    fn test_change_root_requires_privilege_or_path() {
        let mut ec = ErrorCode::new();
        change_root("/nonexistent/ptl", &mut ec);
        assert!(ec.failed());
    }
}
