//! Socket Module
//!
//! Provides socket creation, raw `setsockopt(2)`/`getsockopt(2)`, and the
//! address-based calls.

use std::io;
use std::mem;

use libc::{c_int, c_void, socklen_t};
use log::debug;
use nix::sys::socket::MsgFlags;
use socket2::{Domain, Protocol, SockAddr, Type};

use adapters_file_system::FileDescriptor;
use entities_system_errors::{ErrorSink, SystemError};

/// Owning socket handle
pub type Socket = FileDescriptor;

pub use adapters_file_system::FileDescriptorLike as SocketLike;

/// Create a socket with `socket(2)`
///
/// `None` as the protocol lets the system pick the default for the type.
pub fn create_socket<S: ErrorSink>(domain: Domain, ty: Type, protocol: Option<Protocol>, sink: S) -> S::Output<Socket> {
    let raw_protocol = protocol.map_or(0, c_int::from);
    let fd = unsafe { libc::socket(c_int::from(domain), c_int::from(ty), raw_protocol) };
    if fd < 0 {
        return sink.fail(SystemError::last(), Socket::default(), || {
            format!("socket({:?}, {:?}, {}) failed", domain, ty, raw_protocol)
        });
    }
    debug!("created socket {}", fd);
    sink.succeed(Socket::from_raw(fd))
}

/// Set a socket option from raw memory
///
/// # Safety
///
/// `value` must point to `len` readable bytes laid out as the option expects.
pub unsafe fn set_socket_option_raw<F: SocketLike, S: ErrorSink>(
    sock: F,
    level: c_int,
    name: c_int,
    value: *const c_void,
    len: socklen_t,
    sink: S,
) -> S::Output<()> {
    let ret = libc::setsockopt(sock.c_fd(), level, name, value, len);
    sink.from_status(ret, || format!("setsockopt({}, {}, {}) failed", sock.c_fd(), level, name))
}

/// Read a socket option into raw memory
///
/// On entry `len` is the size of the buffer; on success it is the size
/// the system wrote.
///
/// # Safety
///
/// `value` must point to `*len` writable bytes.
pub unsafe fn get_socket_option_raw<F: SocketLike, S: ErrorSink>(
    sock: F,
    level: c_int,
    name: c_int,
    value: *mut c_void,
    len: &mut socklen_t,
    sink: S,
) -> S::Output<()> {
    let ret = libc::getsockopt(sock.c_fd(), level, name, value, len);
    sink.from_status(ret, || format!("getsockopt({}, {}, {}) failed", sock.c_fd(), level, name))
}

/// Bind `sock` to `addr` with `bind(2)`
pub fn bind_socket<F: SocketLike, S: ErrorSink>(sock: F, addr: &SockAddr, sink: S) -> S::Output<()> {
    let ret = unsafe { libc::bind(sock.c_fd(), addr.as_ptr(), addr.len()) };
    sink.from_status(ret, || format!("bind({}) failed", sock.c_fd()))
}

/// Local address of `sock`, from `getsockname(2)`
pub fn get_socket_name<F: SocketLike, S: ErrorSink>(sock: F, sink: S) -> S::Output<SockAddr> {
    let fd = sock.c_fd();
    let result = unsafe {
        SockAddr::try_init(|storage, len| {
            if libc::getsockname(fd, storage.cast(), len) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        })
    };
    match result {
        Ok(((), addr)) => sink.succeed(addr),
        Err(err) => sink.fail(SystemError::from(err), empty_address(), || format!("getsockname({}) failed", fd)),
    }
}

/// Send `buf` to `addr` with `sendto(2)`, returning the bytes sent
pub fn send_socket<F: SocketLike, S: ErrorSink>(sock: F, buf: &[u8], flags: MsgFlags, addr: &SockAddr, sink: S) -> S::Output<usize> {
    let ret = unsafe {
        libc::sendto(sock.c_fd(), buf.as_ptr().cast(), buf.len(), flags.bits(), addr.as_ptr(), addr.len())
    };
    if ret < 0 {
        return sink.fail(SystemError::last(), 0, || format!("sendto({}, {} bytes) failed", sock.c_fd(), buf.len()));
    }
    sink.succeed(ret as usize)
}

/// Receive into `buf` with `recv(2)`, returning the bytes received
pub fn receive_socket<F: SocketLike, S: ErrorSink>(sock: F, buf: &mut [u8], flags: MsgFlags, sink: S) -> S::Output<usize> {
    let ret = unsafe { libc::recv(sock.c_fd(), buf.as_mut_ptr().cast(), buf.len(), flags.bits()) };
    if ret < 0 {
        return sink.fail(SystemError::last(), 0, || format!("recv({}) failed", sock.c_fd()));
    }
    sink.succeed(ret as usize)
}

/// Receive into `buf` with `recvfrom(2)`, returning the bytes received and
/// the sender's address
pub fn receive_socket_from<F: SocketLike, S: ErrorSink>(
    sock: F,
    buf: &mut [u8],
    flags: MsgFlags,
    sink: S,
) -> S::Output<(usize, SockAddr)> {
    let fd = sock.c_fd();
    let result = unsafe {
        SockAddr::try_init(|storage, len| {
            let ret = libc::recvfrom(fd, buf.as_mut_ptr().cast(), buf.len(), flags.bits(), storage.cast(), len);
            if ret < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(ret as usize)
        })
    };
    match result {
        Ok(received) => sink.succeed(received),
        Err(err) => sink.fail(SystemError::from(err), (0, empty_address()), || format!("recvfrom({}) failed", fd)),
    }
}

fn empty_address() -> SockAddr {
    // SAFETY: an all-zero storage with length zero is a valid unspecified address
    unsafe { SockAddr::new(mem::zeroed(), 0) }
}
