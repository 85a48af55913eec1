//! Socket Options Module
//!
//! Each standard option is a unit type implementing [`SocketOption`], which
//! fixes its level, name, the Rust value it is read and written as, and the
//! C representation passed to the system.
//!
//! ```no_run
//! use adapters_socket::{create_socket, get_socket_option, set_socket_option, ReuseAddr};
//! use entities_system_errors::Throw;
//! use socket2::{Domain, Type};
//!
//! let sock = create_socket(Domain::IPV4, Type::STREAM, None, Throw)?;
//! set_socket_option(&sock, ReuseAddr, true, Throw)?;
//! assert!(get_socket_option(&sock, ReuseAddr, Throw)?);
//! # Ok::<(), entities_system_errors::OsError>(())
//! ```

use std::mem;
use std::time::Duration;

use libc::{c_int, socklen_t};

use crate::socket::{set_socket_option_raw, SocketLike};
use entities_system_errors::{sink_try, ErrorSink, SystemError};

/// A socket option with a fixed level, name and representation
pub trait SocketOption {
    const LEVEL: c_int;
    const NAME: c_int;

    /// Value as seen by callers
    type Value;
    /// Value as laid out for `setsockopt(2)`/`getsockopt(2)`
    type Raw: Copy;

    fn to_raw(value: Self::Value) -> Self::Raw;
    fn from_raw(raw: Self::Raw) -> Self::Value;

    /// Reject values the C representation cannot express
    fn validate(_value: &Self::Value) -> Result<(), SystemError> {
        Ok(())
    }
}

/// Set option `O` on `sock`
pub fn set_socket_option<F, O, S>(sock: F, _option: O, value: O::Value, sink: S) -> S::Output<()>
where
    F: SocketLike,
    O: SocketOption,
    S: ErrorSink,
{
    sink_try!(sink, O::validate(&value), (), "setsockopt({}, {}) given an unrepresentable value", O::LEVEL, O::NAME);
    let encoded = O::to_raw(value);
    unsafe {
        set_socket_option_raw(
            sock,
            O::LEVEL,
            O::NAME,
            (&encoded as *const O::Raw).cast(),
            mem::size_of::<O::Raw>() as socklen_t,
            sink,
        )
    }
}

/// Read option `O` from `sock`
///
/// When the call fails and the sink records, the value returned is the
/// decoding of an all-zero representation.
pub fn get_socket_option<F, O, S>(sock: F, _option: O, sink: S) -> S::Output<O::Value>
where
    F: SocketLike,
    O: SocketOption,
    S: ErrorSink,
{
    // SAFETY: every option representation is plain data
    let mut encoded: O::Raw = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<O::Raw>() as socklen_t;
    let fd = sock.c_fd();
    let ret = unsafe { libc::getsockopt(fd, O::LEVEL, O::NAME, (&mut encoded as *mut O::Raw).cast(), &mut len) };
    if ret != 0 {
        return sink.fail(SystemError::last(), O::from_raw(encoded), || {
            format!("getsockopt({}, {}, {}) failed", fd, O::LEVEL, O::NAME)
        });
    }
    sink.succeed(O::from_raw(encoded))
}

macro_rules! bool_options {
    ($($(#[$meta:meta])* $name:ident => ($level:expr, $opt:expr);)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl SocketOption for $name {
                const LEVEL: c_int = $level;
                const NAME: c_int = $opt;
                type Value = bool;
                type Raw = c_int;

                fn to_raw(value: bool) -> c_int {
                    c_int::from(value)
                }

                fn from_raw(raw: c_int) -> bool {
                    raw != 0
                }
            }
        )+
    };
}

macro_rules! int_options {
    ($($(#[$meta:meta])* $name:ident => ($level:expr, $opt:expr);)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl SocketOption for $name {
                const LEVEL: c_int = $level;
                const NAME: c_int = $opt;
                type Value = c_int;
                type Raw = c_int;

                fn to_raw(value: c_int) -> c_int {
                    value
                }

                fn from_raw(raw: c_int) -> c_int {
                    raw
                }
            }
        )+
    };
}

macro_rules! timeout_options {
    ($($(#[$meta:meta])* $name:ident => ($level:expr, $opt:expr);)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl SocketOption for $name {
                const LEVEL: c_int = $level;
                const NAME: c_int = $opt;
                type Value = Option<Duration>;
                type Raw = libc::timeval;

                fn to_raw(value: Option<Duration>) -> libc::timeval {
                    duration_to_timeval(value)
                }

                fn from_raw(raw: libc::timeval) -> Option<Duration> {
                    timeval_to_duration(raw)
                }

                // A zero timeval means "no timeout"
                fn validate(value: &Option<Duration>) -> Result<(), SystemError> {
                    match value {
                        Some(duration) if duration.is_zero() => Err(SystemError::posix(libc::EINVAL)),
                        _ => Ok(()),
                    }
                }
            }
        )+
    };
}

bool_options! {
    /// `SO_DEBUG`
    Debug => (libc::SOL_SOCKET, libc::SO_DEBUG);
    /// `SO_BROADCAST`
    Broadcast => (libc::SOL_SOCKET, libc::SO_BROADCAST);
    /// `SO_REUSEADDR`
    ReuseAddr => (libc::SOL_SOCKET, libc::SO_REUSEADDR);
    /// `SO_KEEPALIVE`
    KeepAlive => (libc::SOL_SOCKET, libc::SO_KEEPALIVE);
    /// `SO_OOBINLINE`
    OobInline => (libc::SOL_SOCKET, libc::SO_OOBINLINE);
    /// `SO_DONTROUTE`
    DontRoute => (libc::SOL_SOCKET, libc::SO_DONTROUTE);
}

int_options! {
    /// `SO_SNDBUF`; Linux reports twice the requested size
    SndBuf => (libc::SOL_SOCKET, libc::SO_SNDBUF);
    /// `SO_RCVBUF`; Linux reports twice the requested size
    RcvBuf => (libc::SOL_SOCKET, libc::SO_RCVBUF);
    /// `SO_RCVLOWAT`
    RcvLowWatermark => (libc::SOL_SOCKET, libc::SO_RCVLOWAT);
    /// `SO_SNDLOWAT`
    SndLowWatermark => (libc::SOL_SOCKET, libc::SO_SNDLOWAT);
}

timeout_options! {
    /// `SO_RCVTIMEO`; `None` blocks forever
    RcvTimeout => (libc::SOL_SOCKET, libc::SO_RCVTIMEO);
    /// `SO_SNDTIMEO`; `None` blocks forever
    SndTimeout => (libc::SOL_SOCKET, libc::SO_SNDTIMEO);
}

/// `SO_LINGER`; `Some(duration)` lingers on close for up to `duration`
#[derive(Debug, Clone, Copy, Default)]
pub struct Linger;

impl SocketOption for Linger {
    const LEVEL: c_int = libc::SOL_SOCKET;
    const NAME: c_int = libc::SO_LINGER;
    type Value = Option<Duration>;
    type Raw = libc::linger;

    fn to_raw(value: Option<Duration>) -> libc::linger {
        match value {
            Some(duration) => libc::linger {
                l_onoff: 1,
                l_linger: c_int::try_from(duration.as_secs()).unwrap_or(c_int::MAX),
            },
            None => libc::linger { l_onoff: 0, l_linger: 0 },
        }
    }

    fn from_raw(raw: libc::linger) -> Option<Duration> {
        (raw.l_onoff != 0).then(|| Duration::from_secs(raw.l_linger.max(0) as u64))
    }
}

#[cfg(any(target_vendor = "apple", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))]
type MulticastLoopRaw = u8;
#[cfg(not(any(target_vendor = "apple", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd")))]
type MulticastLoopRaw = c_int;

/// `IP_MULTICAST_LOOP`
#[derive(Debug, Clone, Copy, Default)]
pub struct Ipv4MulticastLoop;

impl SocketOption for Ipv4MulticastLoop {
    const LEVEL: c_int = libc::IPPROTO_IP;
    const NAME: c_int = libc::IP_MULTICAST_LOOP;
    type Value = bool;
    type Raw = MulticastLoopRaw;

    fn to_raw(value: bool) -> MulticastLoopRaw {
        MulticastLoopRaw::from(value)
    }

    fn from_raw(raw: MulticastLoopRaw) -> bool {
        raw != 0
    }
}

/// `IPV6_MULTICAST_LOOP`
#[derive(Debug, Clone, Copy, Default)]
pub struct Ipv6MulticastLoop;

impl SocketOption for Ipv6MulticastLoop {
    const LEVEL: c_int = libc::IPPROTO_IPV6;
    const NAME: c_int = libc::IPV6_MULTICAST_LOOP;
    type Value = bool;
    type Raw = c_int;

    fn to_raw(value: bool) -> c_int {
        c_int::from(value)
    }

    fn from_raw(raw: c_int) -> bool {
        raw != 0
    }
}

fn duration_to_timeval(value: Option<Duration>) -> libc::timeval {
    match value {
        Some(duration) => {
            let mut tv = libc::timeval {
                tv_sec: libc::time_t::try_from(duration.as_secs()).unwrap_or(libc::time_t::MAX),
                tv_usec: duration.subsec_micros() as libc::suseconds_t,
            };
            if tv.tv_sec == 0 && tv.tv_usec == 0 && !duration.is_zero() {
                tv.tv_usec = 1;
            }
            tv
        }
        None => libc::timeval { tv_sec: 0, tv_usec: 0 },
    }
}

fn timeval_to_duration(raw: libc::timeval) -> Option<Duration> {
    if raw.tv_sec == 0 && raw.tv_usec == 0 {
        return None;
    }
    Some(Duration::new(raw.tv_sec.max(0) as u64, (raw.tv_usec.max(0) as u32) * 1000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::create_socket;
    use entities_system_errors::{ErrorCode, Throw};
    use socket2::{Domain, Type};

    #[test]
    fn test_bool_option_round_trip() {
        let sock = create_socket(Domain::IPV4, Type::STREAM, None, Throw).unwrap();
        assert!(!get_socket_option(&sock, ReuseAddr, Throw).unwrap());
        set_socket_option(&sock, ReuseAddr, true, Throw).unwrap();
        assert!(get_socket_option(&sock, ReuseAddr, Throw).unwrap());
        set_socket_option(&sock, ReuseAddr, false, Throw).unwrap();
        assert!(!get_socket_option(&sock, ReuseAddr, Throw).unwrap());
    }

    #[test]
    fn test_int_option_round_trip() {
        let sock = create_socket(Domain::IPV4, Type::STREAM, None, Throw).unwrap();
        set_socket_option(&sock, RcvBuf, 8192, Throw).unwrap();
        assert!(get_socket_option(&sock, RcvBuf, Throw).unwrap() >= 8192);
        set_socket_option(&sock, RcvLowWatermark, 16, Throw).unwrap();
        assert_eq!(get_socket_option(&sock, RcvLowWatermark, Throw).unwrap(), 16);
    }

    #[test]
    fn test_timeout_round_trip() {
        let sock = create_socket(Domain::IPV4, Type::DGRAM, None, Throw).unwrap();
        assert_eq!(get_socket_option(&sock, RcvTimeout, Throw).unwrap(), None);
        set_socket_option(&sock, RcvTimeout, Some(Duration::from_millis(1500)), Throw).unwrap();
        assert_eq!(get_socket_option(&sock, RcvTimeout, Throw).unwrap(), Some(Duration::from_millis(1500)));
        // The send timeout is independent
        assert_eq!(get_socket_option(&sock, SndTimeout, Throw).unwrap(), None);
    }

    #[test]
    fn test_linger_round_trip() {
        let sock = create_socket(Domain::IPV4, Type::STREAM, None, Throw).unwrap();
        set_socket_option(&sock, Linger, Some(Duration::from_secs(3)), Throw).unwrap();
        assert_eq!(get_socket_option(&sock, Linger, Throw).unwrap(), Some(Duration::from_secs(3)));
        set_socket_option(&sock, Linger, None, Throw).unwrap();
        assert_eq!(get_socket_option(&sock, Linger, Throw).unwrap(), None);
    }

    #[test]
    fn test_multicast_loop() {
        let sock = create_socket(Domain::IPV4, Type::DGRAM, None, Throw).unwrap();
        set_socket_option(&sock, Ipv4MulticastLoop, false, Throw).unwrap();
        assert!(!get_socket_option(&sock, Ipv4MulticastLoop, Throw).unwrap());
        set_socket_option(&sock, Ipv4MulticastLoop, true, Throw).unwrap();
        assert!(get_socket_option(&sock, Ipv4MulticastLoop, Throw).unwrap());
    }

    #[test]
    fn test_option_on_bad_descriptor() {
        let mut ec = ErrorCode::new();
        assert!(!get_socket_option(-1i32, Broadcast, &mut ec));
        assert!(ec.matches(libc::EBADF));

        let err = set_socket_option(-1i32, KeepAlive, true, Throw).unwrap_err();
        assert!(err.matches(libc::EBADF));
    }

    #[test]
    fn test_timeval_conversion() {
        assert_eq!(timeval_to_duration(duration_to_timeval(None)), None);
        let tv = duration_to_timeval(Some(Duration::new(2, 250_000_000)));
        assert_eq!(tv.tv_sec, 2);
        assert_eq!(tv.tv_usec, 250_000);

        let tv = duration_to_timeval(Some(Duration::from_nanos(500)));
        assert_eq!((tv.tv_sec, tv.tv_usec), (0, 1));
    }

    #[test]
    fn test_sub_microsecond_timeout_still_times_out() {
        let sock = create_socket(Domain::IPV4, Type::DGRAM, None, Throw).unwrap();
        set_socket_option(&sock, RcvTimeout, Some(Duration::from_nanos(500)), Throw).unwrap();
        let timeout = get_socket_option(&sock, RcvTimeout, Throw).unwrap();
        assert!(timeout.is_some());
        assert!(!timeout.unwrap().is_zero());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let sock = create_socket(Domain::IPV4, Type::DGRAM, None, Throw).unwrap();
        set_socket_option(&sock, SndTimeout, Some(Duration::from_secs(3)), Throw).unwrap();

        let err = set_socket_option(&sock, RcvTimeout, Some(Duration::ZERO), Throw).unwrap_err();
        assert!(err.matches(libc::EINVAL));

        let mut ec = ErrorCode::new();
        set_socket_option(&sock, SndTimeout, Some(Duration::ZERO), &mut ec);
        assert!(ec.matches(libc::EINVAL));
        assert_eq!(get_socket_option(&sock, SndTimeout, Throw).unwrap(), Some(Duration::from_secs(3)));
    }
}
