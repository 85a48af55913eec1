//! System Module
//!
//! Provides `sysconf(3)` queries and the host name.

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;

use libc::{c_char, c_int};
use nix::errno::Errno;

use entities_system_errors::{ErrorCode, ErrorSink, SystemError};

const DEFAULT_HOST_NAME_MAX: usize = 255;

/// Query a configurable system limit with `sysconf(3)`
///
/// # Returns
///
/// * `Some(value)` - The limit's current value
/// * `None` - The limit is indeterminate, or the call failed and the sink
///   records instead of raising
pub fn system_config<S: ErrorSink>(name: c_int, sink: S) -> S::Output<Option<i64>> {
    Errno::clear();
    let value = unsafe { libc::sysconf(name) };
    if value == -1 {
        let err = SystemError::last();
        if err.code() != 0 {
            return sink.fail(err, None, || format!("sysconf({}) failed", name));
        }
        return sink.succeed(None);
    }
    sink.succeed(Some(value as i64))
}

/// Copy the host name into `buf` with `gethostname(2)`
///
/// The result is NUL-terminated when it fits.
pub fn get_host_name<S: ErrorSink>(buf: &mut [u8], sink: S) -> S::Output<()> {
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut c_char, buf.len()) };
    sink.from_status(ret, || format!("gethostname(buf, {}) failed", buf.len()))
}

/// Host name of the machine
pub fn host_name<S: ErrorSink>(sink: S) -> S::Output<OsString> {
    let max = system_config(libc::_SC_HOST_NAME_MAX, &mut ErrorCode::new())
        .and_then(|size| usize::try_from(size).ok())
        .unwrap_or(DEFAULT_HOST_NAME_MAX);
    let mut buf = vec![0u8; max + 1];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut c_char, buf.len()) };
    if ret != 0 {
        return sink.fail(SystemError::last(), OsString::new(), || "gethostname failed".to_string());
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    buf.truncate(end);
    sink.succeed(OsString::from_vec(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_system_errors::Throw;
    use std::process::Command;

    #[test]
    fn test_page_size() {
        let page = system_config(libc::_SC_PAGESIZE, Throw).unwrap().unwrap();
        assert!(page >= 4096);
        assert_eq!(page & (page - 1), 0);
    }

    #[test]
    fn test_unknown_name_is_invalid() {
        let err = system_config(32765, Throw).unwrap_err();
        assert!(err.matches(libc::EINVAL));

        let mut ec = ErrorCode::new();
        assert_eq!(system_config(32765, &mut ec), None);
        assert!(ec.matches(libc::EINVAL));
    }

    #[test]
    fn test_host_name_matches_command() {
        let output = Command::new("hostname").output().unwrap();
        let expected = String::from_utf8(output.stdout).unwrap();
        let name = host_name(Throw).unwrap();
        assert_eq!(name.to_str().unwrap(), expected.trim());
    }

    #[test]
    fn test_get_host_name_into_buffer() {
        let mut buf = [0u8; 256];
        get_host_name(&mut buf, Throw).unwrap();
        let end = buf.iter().position(|&b| b == 0).unwrap();
        assert_eq!(&buf[..end], host_name(Throw).unwrap().into_vec().as_slice());
    }
}
