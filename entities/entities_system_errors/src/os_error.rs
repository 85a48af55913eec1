//! Structured System Error
//!
//! Provides [`OsError`], the error raised by the throwing form of every
//! wrapped call: the failed call's [`SystemError`] plus an optional message
//! naming the call and its key arguments.

use std::fmt;
use std::io;

use crate::code::SystemError;

/// Result type of the throwing form of wrapped calls
pub type Result<T> = std::result::Result<T, OsError>;

/// System error with a description of the failed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsError {
    error: SystemError,
    message: Option<String>,
}

impl OsError {
    /// Create an error carrying a formatted message
    pub fn new(error: SystemError, message: impl Into<String>) -> Self {
        Self {
            error,
            message: Some(message.into()),
        }
    }

    /// Create an error without a message
    ///
    /// Used for allocation failures, where formatting is not attempted.
    pub fn bare(error: SystemError) -> Self {
        Self { error, message: None }
    }

    /// Underlying error value
    pub fn error(&self) -> SystemError {
        self.error
    }

    /// Raw numeric code within the error's domain
    pub fn code(&self) -> i32 {
        self.error.code()
    }

    /// Message describing the failed call, if one was formatted
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Compare against a POSIX `errno` value
    pub fn matches(&self, posix_code: i32) -> bool {
        self.error.matches(posix_code)
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", message, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OsError {}

impl From<SystemError> for OsError {
    fn from(error: SystemError) -> Self {
        OsError::bare(error)
    }
}

impl From<OsError> for io::Error {
    fn from(err: OsError) -> Self {
        let kind = io::Error::from(err.error).kind();
        match err.message {
            Some(_) => io::Error::new(kind, err),
            None => io::Error::from(err.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_message() {
        let err = OsError::new(SystemError::posix(libc::ENOENT), "open(\"missing\", 0x0)");
        assert_eq!(err.code(), libc::ENOENT);
        assert_eq!(err.message(), Some("open(\"missing\", 0x0)"));
        let text = err.to_string();
        assert!(text.starts_with("open(\"missing\", 0x0): "));
        assert!(text.ends_with(&SystemError::posix(libc::ENOENT).description()));
    }

    #[test]
    fn test_display_without_message() {
        let err = OsError::bare(SystemError::posix(libc::ENOMEM));
        assert_eq!(err.message(), None);
        assert_eq!(err.to_string(), SystemError::posix(libc::ENOMEM).description());
    }

    #[test]
    fn test_matches_platform_code() {
        let err = OsError::new(SystemError::platform(3), "CreateFile");
        assert!(err.matches(libc::ENOENT));
        assert_eq!(err.error(), SystemError::platform(3));
    }

    #[test]
    #[cfg(unix)]
    fn test_into_io_error() {
        let err = OsError::new(SystemError::posix(libc::ENOENT), "stat");
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        assert!(io_err.to_string().starts_with("stat: "));

        let bare: io::Error = OsError::bare(SystemError::posix(libc::EACCES)).into();
        assert_eq!(bare.raw_os_error(), Some(libc::EACCES));
    }
}
