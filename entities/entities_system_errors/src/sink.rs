//! Error Sinks
//!
//! Provides the protocol through which wrapped calls report failure.
//!
//! Every fallible operation takes exactly one sink argument by value. The
//! operation calls [`ErrorSink::succeed`] with its result or
//! [`ErrorSink::fail`] with the error, a fallback value (the empty wrapper or
//! zero) and a closure producing the message. The sink's `Output<T>` decides
//! the operation's return type, so the choice between raising and recording
//! is made at compile time.

use log::debug;

use crate::code::SystemError;
use crate::os_error::{OsError, Result};

/// Destination for errors reported by wrapped calls
pub trait ErrorSink: Sized {
    /// What an operation producing `T` returns with this sink
    type Output<T>;

    /// Report success; clears any previously recorded error
    fn succeed<T>(self, value: T) -> Self::Output<T>;

    /// Report failure
    ///
    /// # Arguments
    ///
    /// * `error` - The error of the failed call
    /// * `fallback` - Value returned by sinks that record instead of raising
    /// * `message` - Produces the description of the failed call; invoked at
    ///   most once and only by sinks that keep it
    fn fail<T, M>(self, error: SystemError, fallback: T, message: M) -> Self::Output<T>
    where
        M: FnOnce() -> String;

    /// Route a `Result` through the sink
    fn complete<T, M>(
        self,
        result: std::result::Result<T, SystemError>,
        fallback: T,
        message: M,
    ) -> Self::Output<T>
    where
        M: FnOnce() -> String,
    {
        match result {
            Ok(value) => self.succeed(value),
            Err(error) => self.fail(error, fallback, message),
        }
    }

    /// Route the return value of a call that returns `-1` and sets `errno`
    fn from_status<M>(self, ret: i32, message: M) -> Self::Output<()>
    where
        M: FnOnce() -> String,
    {
        if ret == -1 {
            return self.fail(SystemError::last(), (), message);
        }
        self.succeed(())
    }
}

/// Raising sink: failures become `Err(OsError)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Throw;

impl Throw {
    pub(crate) fn raise<M>(error: SystemError, message: M) -> OsError
    where
        M: FnOnce() -> String,
    {
        if error.is_out_of_memory() {
            OsError::bare(error)
        } else {
            OsError::new(error, message())
        }
    }
}

impl ErrorSink for Throw {
    type Output<T> = Result<T>;

    fn succeed<T>(self, value: T) -> Result<T> {
        Ok(value)
    }

    fn fail<T, M>(self, error: SystemError, _fallback: T, message: M) -> Result<T>
    where
        M: FnOnce() -> String,
    {
        Err(Throw::raise(error, message))
    }
}

/// Code-only sink: stores the error code and never formats a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCode {
    error: Option<SystemError>,
}

impl ErrorCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded error, if the last call failed
    pub fn code(&self) -> Option<SystemError> {
        self.error
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// True if the recorded error corresponds to `posix_code`
    pub fn matches(&self, posix_code: i32) -> bool {
        self.error.map_or(false, |e| e.matches(posix_code))
    }

    pub fn clear(&mut self) {
        self.error = None;
    }
}

impl<'a> ErrorSink for &'a mut ErrorCode {
    type Output<T> = T;

    fn succeed<T>(self, value: T) -> T {
        self.error = None;
        value
    }

    fn fail<T, M>(self, error: SystemError, fallback: T, _message: M) -> T
    where
        M: FnOnce() -> String,
    {
        debug!("recorded error code {:?}/{}", error.domain(), error.code());
        self.error = Some(error);
        fallback
    }
}

/// Reporting sink: stores the whole [`OsError`] including its message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    error: Option<OsError>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&OsError> {
        self.error.as_ref()
    }

    pub fn code(&self) -> Option<SystemError> {
        self.error.as_ref().map(OsError::error)
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn matches(&self, posix_code: i32) -> bool {
        self.error.as_ref().map_or(false, |e| e.matches(posix_code))
    }

    /// Take the recorded error, leaving the report clear
    pub fn take(&mut self) -> Option<OsError> {
        self.error.take()
    }

    pub fn clear(&mut self) {
        self.error = None;
    }
}

impl<'a> ErrorSink for &'a mut ErrorReport {
    type Output<T> = T;

    fn succeed<T>(self, value: T) -> T {
        self.error = None;
        value
    }

    fn fail<T, M>(self, error: SystemError, fallback: T, message: M) -> T
    where
        M: FnOnce() -> String,
    {
        let err = Throw::raise(error, message);
        debug!("recorded error: {}", err);
        self.error = Some(err);
        fallback
    }
}

/// Raise unless `ret` indicates success
///
/// For calls that return `-1` and set `errno` whose failures are never
/// expected by callers (signal set edits, signal actions and masks).
pub fn check_status<M>(ret: i32, message: M) -> Result<()>
where
    M: FnOnce() -> String,
{
    Throw.from_status(ret, message)
}

/// Raise unless `code` is zero
///
/// For calls that return the error number directly (`posix_spawn` setup).
pub fn check_code<M>(code: i32, message: M) -> Result<()>
where
    M: FnOnce() -> String,
{
    if code != 0 {
        return Throw.fail(SystemError::posix(code), (), message);
    }
    Ok(())
}
