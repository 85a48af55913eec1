//! Allow-List Sink
//!
//! Provides [`AllowedErrors`], a sink that records a fixed set of expected
//! POSIX codes and escalates every other failure to the raising path.

use log::debug;

use crate::code::SystemError;
use crate::os_error::Result;
use crate::sink::{ErrorSink, Throw};

/// Sink accepting exactly the listed POSIX codes
///
/// Platform-domain errors are compared through the translation table, so an
/// allow-list of `ENOENT` also accepts `ERROR_FILE_NOT_FOUND`.
///
/// # Examples
///
/// ```
/// use entities_system_errors::{AllowedErrors, ErrorSink, SystemError};
///
/// let mut allowed = AllowedErrors::new([libc::ENOENT, libc::EDOM]);
/// let value = (&mut allowed).fail(SystemError::posix(libc::ENOENT), 0, String::new);
/// assert_eq!(value.unwrap(), 0);
/// assert!(allowed.failed());
///
/// let escalated = (&mut allowed).fail(SystemError::posix(libc::EACCES), 0, String::new);
/// assert!(escalated.is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedErrors<const N: usize> {
    allowed: [i32; N],
    error: Option<SystemError>,
}

impl<const N: usize> AllowedErrors<N> {
    pub fn new(allowed: [i32; N]) -> Self {
        Self { allowed, error: None }
    }

    /// Codes this sink accepts
    pub fn allowed(&self) -> &[i32] {
        &self.allowed
    }

    /// True if `error` corresponds to one of the allowed codes
    pub fn accepts(&self, error: SystemError) -> bool {
        self.allowed.iter().any(|&code| error.matches(code))
    }

    /// Recorded error, if the last call failed with an allowed code
    pub fn code(&self) -> Option<SystemError> {
        self.error
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn matches(&self, posix_code: i32) -> bool {
        self.error.map_or(false, |e| e.matches(posix_code))
    }

    pub fn clear(&mut self) {
        self.error = None;
    }
}

#[cfg(unix)]
impl<const N: usize> From<[nix::errno::Errno; N]> for AllowedErrors<N> {
    fn from(allowed: [nix::errno::Errno; N]) -> Self {
        Self::new(allowed.map(|errno| errno as i32))
    }
}

impl<'a, const N: usize> ErrorSink for &'a mut AllowedErrors<N> {
    type Output<T> = Result<T>;

    fn succeed<T>(self, value: T) -> Result<T> {
        self.error = None;
        Ok(value)
    }

    fn fail<T, M>(self, error: SystemError, fallback: T, message: M) -> Result<T>
    where
        M: FnOnce() -> String,
    {
        if self.accepts(error) {
            debug!("recorded allowed error code {:?}/{}", error.domain(), error.code());
            self.error = Some(error);
            return Ok(fallback);
        }
        self.error = None;
        Throw.fail(error, fallback, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_listed_codes() {
        let mut allowed = AllowedErrors::new([libc::ENOENT, libc::EDOM]);
        let value = (&mut allowed).fail(SystemError::posix(libc::EDOM), 5u32, String::new);
        assert_eq!(value.unwrap(), 5);
        assert!(allowed.matches(libc::EDOM));
        assert_eq!(allowed.code(), Some(SystemError::posix(libc::EDOM)));
    }

    #[test]
    fn test_escalates_other_codes() {
        let mut allowed = AllowedErrors::new([libc::EDOM]);
        let err = (&mut allowed)
            .fail(SystemError::posix(libc::ENOENT), (), || "open(\"x\")".to_string())
            .unwrap_err();
        assert!(err.matches(libc::ENOENT));
        assert_eq!(err.message(), Some("open(\"x\")"));
        assert!(!allowed.failed());
    }

    #[test]
    fn test_escalation_clears_earlier_record() {
        let mut allowed = AllowedErrors::new([libc::ENOENT]);
        let _ = (&mut allowed).fail(SystemError::posix(libc::ENOENT), (), String::new);
        assert!(allowed.matches(libc::ENOENT));

        let err = (&mut allowed)
            .fail(SystemError::posix(libc::EBADF), (), || "fstat(-1)".to_string())
            .unwrap_err();
        assert!(err.matches(libc::EBADF));
        assert!(!allowed.failed());
        assert_eq!(allowed.code(), None);
    }

    #[test]
    fn test_platform_codes_compare_through_table() {
        let allowed = AllowedErrors::new([libc::ENOENT]);
        assert!(allowed.accepts(SystemError::platform(2)));
        assert!(!allowed.accepts(SystemError::platform(5)));
    }

    #[test]
    fn test_success_clears() {
        let mut allowed = AllowedErrors::new([libc::EAGAIN]);
        let _ = (&mut allowed).fail(SystemError::posix(libc::EAGAIN), (), String::new);
        assert!(allowed.failed());
        assert_eq!((&mut allowed).succeed(1).unwrap(), 1);
        assert!(!allowed.failed());
        allowed.clear();
        assert_eq!(allowed.allowed(), &[libc::EAGAIN]);
    }

    #[test]
    #[cfg(unix)]
    fn test_from_errno_array() {
        use nix::errno::Errno;

        let allowed = AllowedErrors::from([Errno::EINTR, Errno::EAGAIN]);
        assert_eq!(allowed.allowed(), &[libc::EINTR, libc::EAGAIN]);
    }
}
