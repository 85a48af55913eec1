//! System Error Values
//!
//! Provides the `(domain, code)` pair reported by every wrapped system call.
//! POSIX `errno` values live in the [`ErrorDomain::Posix`] domain. Native codes
//! of the alternate platform (Win32 and Winsock) live in
//! [`ErrorDomain::Platform`] and are compared against POSIX codes through the
//! translation table in [`platform_map`](crate::platform_map).

use std::fmt;
use std::io;

use crate::platform_map::posix_equivalent;

/// Code space an error value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorDomain {
    /// POSIX `errno` space
    Posix,
    /// Platform-specific code space (Win32 / Winsock)
    Platform,
}

/// Error value produced by a failed system call
///
/// Small and `Copy`; it is produced by an operation and consumed immediately
/// by an error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemError {
    domain: ErrorDomain,
    code: i32,
}

impl SystemError {
    /// Create an error in the POSIX `errno` domain
    pub const fn posix(code: i32) -> Self {
        Self {
            domain: ErrorDomain::Posix,
            code,
        }
    }

    /// Create an error in the platform code domain
    pub const fn platform(code: i32) -> Self {
        Self {
            domain: ErrorDomain::Platform,
            code,
        }
    }

    /// Capture the calling thread's current `errno`
    ///
    /// Must be called immediately after the failing call, before anything
    /// else has a chance to overwrite `errno`.
    pub fn last() -> Self {
        #[cfg(unix)]
        {
            Self::posix(nix::errno::Errno::last() as i32)
        }
        #[cfg(not(unix))]
        {
            Self::from(io::Error::last_os_error())
        }
    }

    /// Code space of this error
    pub fn domain(&self) -> ErrorDomain {
        self.domain
    }

    /// Raw numeric code within its domain
    pub fn code(&self) -> i32 {
        self.code
    }

    /// POSIX code this error corresponds to
    ///
    /// # Returns
    ///
    /// The code itself for POSIX errors, the table translation for platform
    /// errors, or `None` when a platform code has no POSIX equivalent.
    pub fn posix_equivalent(&self) -> Option<i32> {
        match self.domain {
            ErrorDomain::Posix => Some(self.code),
            ErrorDomain::Platform => posix_equivalent(self.code),
        }
    }

    /// Compare against a POSIX `errno` value, translating platform codes
    pub fn matches(&self, posix_code: i32) -> bool {
        self.posix_equivalent() == Some(posix_code)
    }

    /// True for allocation failures, which must never format a message
    pub fn is_out_of_memory(&self) -> bool {
        self.matches(libc::ENOMEM)
    }

    /// Human-readable description of the code
    pub fn description(&self) -> String {
        match self.domain {
            ErrorDomain::Posix => posix_description(self.code),
            #[cfg(windows)]
            ErrorDomain::Platform => io::Error::from_raw_os_error(self.code).to_string(),
            #[cfg(not(windows))]
            ErrorDomain::Platform => match posix_equivalent(self.code) {
                Some(posix) => format!("{} (platform error {})", posix_description(posix), self.code),
                None => format!("platform error {}", self.code),
            },
        }
    }
}

#[cfg(unix)]
fn posix_description(code: i32) -> String {
    nix::errno::Errno::from_i32(code).desc().to_string()
}

#[cfg(not(unix))]
fn posix_description(code: i32) -> String {
    format!("errno {}", code)
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<io::Error> for SystemError {
    fn from(err: io::Error) -> Self {
        match err.raw_os_error() {
            #[cfg(windows)]
            Some(code) => SystemError::platform(code),
            #[cfg(not(windows))]
            Some(code) => SystemError::posix(code),
            None => SystemError::posix(libc::EIO),
        }
    }
}

impl From<SystemError> for io::Error {
    fn from(err: SystemError) -> Self {
        match err.domain {
            #[cfg(unix)]
            ErrorDomain::Posix => io::Error::from_raw_os_error(err.code),
            #[cfg(windows)]
            ErrorDomain::Platform => io::Error::from_raw_os_error(err.code),
            _ => io::Error::new(io::ErrorKind::Other, err.description()),
        }
    }
}

#[cfg(unix)]
impl From<nix::errno::Errno> for SystemError {
    fn from(errno: nix::errno::Errno) -> Self {
        SystemError::posix(errno as i32)
    }
}

#[cfg(unix)]
impl PartialEq<nix::errno::Errno> for SystemError {
    fn eq(&self, other: &nix::errno::Errno) -> bool {
        self.matches(*other as i32)
    }
}
