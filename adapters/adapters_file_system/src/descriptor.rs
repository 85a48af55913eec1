//! File Descriptor Module
//!
//! Provides [`FileDescriptor`], the owning wrapper of a raw descriptor, the
//! [`FileDescriptorLike`] adaptor accepted wherever a descriptor argument is
//! expected, and [`Pipe`].
//!
//! A `FileDescriptor` is either bound to a descriptor or empty (`-1`). Moving
//! out of it with [`std::mem::take`] leaves the source empty. Dropping a bound
//! wrapper closes the descriptor exactly once.

use std::fs::File;
use std::io::{Stderr, Stdin, Stdout};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::os::unix::io::{AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::net::{UnixDatagram, UnixListener, UnixStream};

use log::trace;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

use entities_c_strings::CPath;
use entities_system_errors::{sink_try, ErrorSink, SystemError};

#[cfg(any(
    target_os = "linux",
    target_vendor = "apple",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
extern "C" {
    fn mkostemps(template: *mut libc::c_char, suffixlen: libc::c_int, flags: libc::c_int) -> libc::c_int;
}

/// Value that can be passed where a raw descriptor is expected
pub trait FileDescriptorLike {
    fn c_fd(&self) -> RawFd;
}

/// Owning wrapper of a file descriptor
#[derive(Debug)]
pub struct FileDescriptor {
    fd: RawFd,
}

impl Default for FileDescriptor {
    fn default() -> Self {
        Self { fd: -1 }
    }
}

impl FileDescriptor {
    /// Take ownership of `fd`
    pub fn from_raw(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Open `path` with `open(2)`
    ///
    /// # Arguments
    ///
    /// * `path` - Anything accepted as a path
    /// * `flags` - `O_*` flags
    /// * `mode` - Permissions used when the call creates the file
    /// * `sink` - Error sink
    ///
    /// # Returns
    ///
    /// The bound wrapper, or an empty one if the call failed and the sink
    /// records instead of raising.
    pub fn open<P: CPath, S: ErrorSink>(path: P, flags: OFlag, mode: Mode, sink: S) -> S::Output<FileDescriptor> {
        let c_path = sink_try!(
            sink,
            path.c_path(),
            FileDescriptor::default(),
            "cannot open path containing NUL"
        );
        let fd = unsafe { libc::open(c_path.as_ptr(), flags.bits(), libc::c_uint::from(mode.bits())) };
        if fd < 0 {
            return sink.fail(SystemError::last(), FileDescriptor::default(), || {
                format!("cannot open {}", c_path.to_string_lossy())
            });
        }
        sink.succeed(FileDescriptor::from_raw(fd))
    }

    /// Create and open a unique temporary file with `mkostemps(3)`
    ///
    /// `template` must end in `XXXXXX` followed by `suffix_len` suffix bytes
    /// and a terminating NUL. On success the `X`s are replaced in place with
    /// the generated name.
    #[cfg(any(
        target_os = "linux",
        target_vendor = "apple",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    pub fn open_temp<S: ErrorSink>(template: &mut [u8], suffix_len: usize, flags: OFlag, sink: S) -> S::Output<FileDescriptor> {
        let terminated = template.last() == Some(&0) && !template[..template.len() - 1].contains(&0);
        let suffix = libc::c_int::try_from(suffix_len).ok().filter(|_| terminated);
        let suffix = sink_try!(
            sink,
            suffix.ok_or(SystemError::posix(libc::EINVAL)),
            FileDescriptor::default(),
            "mkostemps({}, {}) failed",
            String::from_utf8_lossy(&template[..]),
            suffix_len
        );
        let fd = unsafe { mkostemps(template.as_mut_ptr().cast(), suffix, flags.bits()) };
        if fd == -1 {
            return sink.fail(SystemError::last(), FileDescriptor::default(), || {
                let name = &template[..template.len() - 1];
                format!("mkostemps({}, {}) failed", String::from_utf8_lossy(name), suffix_len)
            });
        }
        sink.succeed(FileDescriptor::from_raw(fd))
    }

    /// Raw descriptor, `-1` if empty
    pub fn get(&self) -> RawFd {
        self.fd
    }

    pub fn is_valid(&self) -> bool {
        self.fd >= 0
    }

    /// Give up ownership without closing
    pub fn release(&mut self) -> RawFd {
        std::mem::replace(&mut self.fd, -1)
    }

    /// Close the descriptor; a no-op on an empty wrapper
    pub fn close(&mut self) {
        if self.fd >= 0 {
            trace!("closing descriptor {}", self.fd);
            unsafe { libc::close(self.fd) };
            self.fd = -1;
        }
    }

    /// Create a new independent descriptor for the same file with `dup(2)`
    pub fn duplicate<S: ErrorSink>(&self, sink: S) -> S::Output<FileDescriptor> {
        let fd = unsafe { libc::dup(self.fd) };
        if fd < 0 {
            return sink.fail(SystemError::last(), FileDescriptor::default(), || format!("dup({}) failed", self.fd));
        }
        sink.succeed(FileDescriptor::from_raw(fd))
    }

    /// Make `target` refer to the same file with `dup2(2)`
    ///
    /// `target` is not owned by this call; if it was open it is closed by
    /// the system first.
    pub fn duplicate_to<F: FileDescriptorLike, S: ErrorSink>(&self, target: F, sink: S) -> S::Output<()> {
        let target = target.c_fd();
        let ret = unsafe { libc::dup2(self.fd, target) };
        if ret < 0 {
            return sink.fail(SystemError::last(), (), || format!("dup2({},{}) failed", self.fd, target));
        }
        sink.succeed(())
    }

    /// Read into `buf`, returning the number of bytes read
    pub fn read<S: ErrorSink>(&self, buf: &mut [u8], sink: S) -> S::Output<usize> {
        let ret = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        if ret < 0 {
            return sink.fail(SystemError::last(), 0, || format!("read({}) failed", self.fd));
        }
        sink.succeed(ret as usize)
    }

    /// Write from `buf`, returning the number of bytes written
    pub fn write<S: ErrorSink>(&self, buf: &[u8], sink: S) -> S::Output<usize> {
        let ret = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
        if ret < 0 {
            return sink.fail(SystemError::last(), 0, || format!("write({}) failed", self.fd));
        }
        sink.succeed(ret as usize)
    }
}

impl Drop for FileDescriptor {
    fn drop(&mut self) {
        self.close();
    }
}

impl AsRawFd for FileDescriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl IntoRawFd for FileDescriptor {
    fn into_raw_fd(mut self) -> RawFd {
        self.release()
    }
}

impl FromRawFd for FileDescriptor {
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self::from_raw(fd)
    }
}

impl From<OwnedFd> for FileDescriptor {
    fn from(fd: OwnedFd) -> Self {
        Self::from_raw(fd.into_raw_fd())
    }
}

impl From<File> for FileDescriptor {
    fn from(file: File) -> Self {
        Self::from_raw(file.into_raw_fd())
    }
}

impl FileDescriptorLike for RawFd {
    fn c_fd(&self) -> RawFd {
        *self
    }
}

impl FileDescriptorLike for FileDescriptor {
    fn c_fd(&self) -> RawFd {
        self.fd
    }
}

impl FileDescriptorLike for BorrowedFd<'_> {
    fn c_fd(&self) -> RawFd {
        self.as_raw_fd()
    }
}

macro_rules! impl_descriptor_like {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FileDescriptorLike for $ty {
                fn c_fd(&self) -> RawFd {
                    self.as_raw_fd()
                }
            }
        )+
    };
}

impl_descriptor_like!(
    File,
    OwnedFd,
    Stdin,
    Stdout,
    Stderr,
    TcpListener,
    TcpStream,
    UdpSocket,
    UnixDatagram,
    UnixListener,
    UnixStream,
);

impl<T: FileDescriptorLike + ?Sized> FileDescriptorLike for &T {
    fn c_fd(&self) -> RawFd {
        (**self).c_fd()
    }
}

impl<T: FileDescriptorLike + ?Sized> FileDescriptorLike for &mut T {
    fn c_fd(&self) -> RawFd {
        (**self).c_fd()
    }
}

/// Both ends of a pipe
#[derive(Debug, Default)]
pub struct Pipe {
    pub read_end: FileDescriptor,
    pub write_end: FileDescriptor,
}

impl Pipe {
    /// Create a pipe with `pipe(2)`; both ends are empty on failure
    pub fn create<S: ErrorSink>(sink: S) -> S::Output<Pipe> {
        let mut fds: [RawFd; 2] = [-1, -1];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return sink.fail(SystemError::last(), Pipe::default(), || "pipe() call failed".to_string());
        }
        sink.succeed(Pipe {
            read_end: FileDescriptor::from_raw(fds[0]),
            write_end: FileDescriptor::from_raw(fds[1]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_system_errors::{ErrorCode, Throw};

    fn is_open(fd: RawFd) -> bool {
        unsafe { libc::fcntl(fd, libc::F_GETFD) != -1 }
    }

    #[test]
    fn test_default_is_empty() {
        let fd = FileDescriptor::default();
        assert!(!fd.is_valid());
        assert_eq!(fd.get(), -1);
    }

    #[test]
    fn test_open_missing_reports_enoent() {
        let err = FileDescriptor::open("/nonexistent/ptl/file", OFlag::O_RDONLY, Mode::empty(), Throw).unwrap_err();
        assert!(err.matches(libc::ENOENT));
        assert!(err.message().unwrap_or_default().contains("/nonexistent/ptl/file"));

        let mut ec = ErrorCode::new();
        let fd = FileDescriptor::open("/nonexistent/ptl/file", OFlag::O_RDONLY, Mode::empty(), &mut ec);
        assert!(!fd.is_valid());
        assert!(ec.matches(libc::ENOENT));
    }

    #[test]
    fn test_open_interior_nul() {
        let mut ec = ErrorCode::new();
        let fd = FileDescriptor::open("bad\0path", OFlag::O_RDONLY, Mode::empty(), &mut ec);
        assert!(!fd.is_valid());
        assert!(ec.matches(libc::EINVAL));
    }

    #[test]
    fn test_take_leaves_source_empty() {
        let mut pipe = Pipe::create(Throw).unwrap();
        let raw = pipe.read_end.get();
        let taken = std::mem::take(&mut pipe.read_end);
        assert!(!pipe.read_end.is_valid());
        assert_eq!(taken.get(), raw);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut pipe = Pipe::create(Throw).unwrap();
        let raw = pipe.write_end.get();
        pipe.write_end.close();
        assert!(!pipe.write_end.is_valid());
        assert!(!is_open(raw));
        pipe.write_end.close();
        assert!(!pipe.write_end.is_valid());
    }

    #[test]
    fn test_release_keeps_descriptor_open() {
        let mut pipe = Pipe::create(Throw).unwrap();
        let raw = pipe.read_end.release();
        assert!(!pipe.read_end.is_valid());
        drop(pipe);
        assert!(is_open(raw));
        drop(FileDescriptor::from_raw(raw));
        assert!(!is_open(raw));
    }

    #[test]
    fn test_read_write_through_pipe() {
        let pipe = Pipe::create(Throw).unwrap();
        assert_eq!(pipe.write_end.write(b"ping", Throw).unwrap(), 4);
        let mut buf = [0u8; 8];
        let n = pipe.read_end.read(&mut buf, Throw).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }

    #[test]
    fn test_duplicate_is_independent() {
        let pipe = Pipe::create(Throw).unwrap();
        let dup = pipe.write_end.duplicate(Throw).unwrap();
        assert_ne!(dup.get(), pipe.write_end.get());
        dup.write(b"x", Throw).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(pipe.read_end.read(&mut buf, Throw).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_to_target() {
        let first = Pipe::create(Throw).unwrap();
        let second = Pipe::create(Throw).unwrap();
        first.write_end.duplicate_to(&second.write_end, Throw).unwrap();
        second.write_end.write(b"y", Throw).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(first.read_end.read(&mut buf, Throw).unwrap(), 1);
        assert_eq!(&buf, b"y");
    }

    #[test]
    fn test_bad_descriptor_errors() {
        let empty = FileDescriptor::default();
        let mut ec = ErrorCode::new();
        assert_eq!(empty.read(&mut [0u8; 4], &mut ec), 0);
        assert!(ec.matches(libc::EBADF));
        assert!(!empty.duplicate(&mut ec).is_valid());
        assert!(ec.matches(libc::EBADF));
    }

    #[test]
    fn test_descriptor_like_adaptors() {
        assert_eq!(7i32.c_fd(), 7);
        assert_eq!(std::io::stdout().c_fd(), 1);
        let pipe = Pipe::create(Throw).unwrap();
        assert_eq!((&pipe.read_end).c_fd(), pipe.read_end.get());
    }

    #[test]
    fn test_open_temp_rewrites_template() {
        let dir = tempfile::tempdir().unwrap();
        let mut template = dir.path().join("ptlXXXXXX.txt").into_os_string().into_string().unwrap().into_bytes();
        template.push(0);
        let fd = FileDescriptor::open_temp(&mut template, 4, OFlag::O_CLOEXEC, Throw).unwrap();
        assert!(fd.is_valid());
        let name = String::from_utf8(template[..template.len() - 1].to_vec()).unwrap();
        assert!(!name.contains("XXXXXX"));
        assert!(name.ends_with(".txt"));
        assert!(std::path::Path::new(&name).exists());
    }

    #[test]
    fn test_open_temp_requires_terminator() {
        let mut template = b"ptlXXXXXX".to_vec();
        let mut ec = ErrorCode::new();
        let fd = FileDescriptor::open_temp(&mut template, 0, OFlag::empty(), &mut ec);
        assert!(!fd.is_valid());
        assert!(ec.matches(libc::EINVAL));
    }
}
