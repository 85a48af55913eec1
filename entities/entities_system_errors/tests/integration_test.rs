//! Integration tests for entities_system_errors crate
//!
//! These tests drive a sink-generic operation through every built-in sink and
//! check that the throwing and recording forms agree.

use entities_system_errors::*;

fn lookup<S: ErrorSink>(code: Option<SystemError>, sink: S) -> S::Output<Option<u32>> {
    match code {
        Some(error) => sink.fail(error, None, || format!("lookup({:?})", error)),
        None => sink.succeed(Some(42)),
    }
}

fn parse_then_lookup<S: ErrorSink>(input: &str, sink: S) -> S::Output<Option<u32>> {
    let value: u32 = sink_try!(
        sink,
        input.parse::<u32>().map_err(|_| SystemError::posix(libc::EINVAL)),
        None,
        "parse({:?})",
        input
    );
    sink.succeed(Some(value))
}

#[test]
fn test_all_sinks_agree_on_error_code() {
    let error = SystemError::posix(libc::ENOENT);

    let thrown = lookup(Some(error), Throw).unwrap_err();

    let mut ec = ErrorCode::new();
    assert_eq!(lookup(Some(error), &mut ec), None);

    let mut report = ErrorReport::new();
    assert_eq!(lookup(Some(error), &mut report), None);

    let mut allowed = AllowedErrors::new([libc::ENOENT]);
    assert_eq!(lookup(Some(error), &mut allowed).unwrap(), None);

    assert_eq!(thrown.error(), error);
    assert_eq!(ec.code(), Some(error));
    assert_eq!(report.code(), Some(error));
    assert_eq!(allowed.code(), Some(error));
    assert_eq!(report.error().map(ToString::to_string), Some(thrown.to_string()));
}

#[test]
fn test_all_sinks_agree_on_success() {
    assert_eq!(lookup(None, Throw).unwrap(), Some(42));

    let mut ec = ErrorCode::new();
    assert_eq!(lookup(None, &mut ec), Some(42));
    assert!(!ec.failed());

    let mut allowed = AllowedErrors::new([libc::EDOM]);
    assert_eq!(lookup(None, &mut allowed).unwrap(), Some(42));
    assert!(!allowed.failed());
}

#[test]
fn test_allowed_errors_escalates_unlisted() {
    let mut allowed = AllowedErrors::new([libc::EDOM]);
    let err = lookup(Some(SystemError::posix(libc::ENOENT)), &mut allowed).unwrap_err();
    assert!(err.matches(libc::ENOENT));
    assert!(!allowed.failed());
}

#[test]
fn test_sink_try_returns_through_sink() {
    assert_eq!(parse_then_lookup("17", Throw).unwrap(), Some(17));

    let err = parse_then_lookup("x", Throw).unwrap_err();
    assert!(err.matches(libc::EINVAL));
    assert_eq!(err.message(), Some("parse(\"x\")"));

    let mut ec = ErrorCode::new();
    assert_eq!(parse_then_lookup("x", &mut ec), None);
    assert!(ec.matches(libc::EINVAL));
}

#[test]
fn test_platform_error_through_sinks() {
    // WSAECONNRESET
    let error = SystemError::platform(10054);
    let mut allowed = AllowedErrors::new([libc::ECONNRESET]);
    assert!(lookup(Some(error), &mut allowed).is_ok());
    assert!(allowed.matches(libc::ECONNRESET));
    assert_eq!(allowed.code().map(|e| e.domain()), Some(ErrorDomain::Platform));
}
