//! Signals Module
//!
//! Provides signal sets, signal names and messages, sending signals, and
//! installing handlers through `signal(2)` or `sigaction(2)`.
//!
//! Signal-set edits, actions and masks never fail for valid arguments, so
//! they always raise instead of taking an error sink.

use std::ffi::CStr;
use std::fmt;
use std::mem;
use std::ptr;

use libc::{c_int, sigset_t};
use nix::errno::Errno;
use nix::sys::signal::{SigHandler, SigmaskHow, Signal};

use entities_system_errors::{check_status, ErrorSink, Result, SystemError, Throw};

use crate::child_process::ProcessLike;

/// Set of signals (`sigset_t`)
#[derive(Clone, Copy)]
pub struct SignalSet {
    set: sigset_t,
}

impl SignalSet {
    /// Empty set
    pub fn new() -> Self {
        Self::none()
    }

    pub fn none() -> Self {
        let mut set: sigset_t = unsafe { mem::zeroed() };
        unsafe { libc::sigemptyset(&mut set) };
        Self { set }
    }

    pub fn all() -> Self {
        let mut set: sigset_t = unsafe { mem::zeroed() };
        unsafe { libc::sigfillset(&mut set) };
        Self { set }
    }

    pub fn add(&mut self, signo: c_int) -> Result<()> {
        check_status(unsafe { libc::sigaddset(&mut self.set, signo) }, || {
            format!("sigaddset(..., {}) failed", signo)
        })
    }

    pub fn del(&mut self, signo: c_int) -> Result<()> {
        check_status(unsafe { libc::sigdelset(&mut self.set, signo) }, || {
            format!("sigdelset(..., {}) failed", signo)
        })
    }

    pub fn is_member(&self, signo: c_int) -> Result<bool> {
        let ret = unsafe { libc::sigismember(&self.set, signo) };
        check_status(ret, || format!("sigismember(..., {}) failed", signo))?;
        Ok(ret != 0)
    }

    pub fn get(&self) -> &sigset_t {
        &self.set
    }

    pub fn get_mut(&mut self) -> &mut sigset_t {
        &mut self.set
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        Self::none()
    }
}

impl From<sigset_t> for SignalSet {
    fn from(set: sigset_t) -> Self {
        Self { set }
    }
}

impl fmt::Debug for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<&str> = Signal::iterator()
            .filter(|sig| unsafe { libc::sigismember(&self.set, *sig as c_int) } == 1)
            .map(Signal::as_str)
            .collect();
        f.debug_tuple("SignalSet").field(&members).finish()
    }
}

/// Abbreviated signal name without the `SIG` prefix
///
/// # Examples
///
/// ```
/// use adapters_process_control::signal_name;
///
/// assert_eq!(signal_name(libc::SIGINT), "INT");
/// assert_eq!(signal_name(12345), "12345");
/// ```
pub fn signal_name(signo: c_int) -> String {
    match Signal::try_from(signo) {
        Ok(sig) => {
            let name = sig.as_str();
            name.strip_prefix("SIG").unwrap_or(name).to_string()
        }
        Err(_) => signo.to_string(),
    }
}

/// Description of a signal from `strsignal(3)`
pub fn signal_message<S: ErrorSink>(signo: c_int, sink: S) -> S::Output<String> {
    Errno::clear();
    let message = unsafe { libc::strsignal(signo) };
    let errno = Errno::last();
    if errno != Errno::UnknownErrno {
        return sink.fail(SystemError::from(errno), String::new(), || {
            format!("strsignal({}) failed", signo)
        });
    }
    if message.is_null() {
        return sink.succeed(String::new());
    }
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
    sink.succeed(text)
}

/// Send `signo` to a process with `kill(2)`
pub fn send_signal<P: ProcessLike, S: ErrorSink>(process: P, signo: c_int, sink: S) -> S::Output<()> {
    let pid = process.c_pid();
    let ret = unsafe { libc::kill(pid, signo) };
    sink.from_status(ret, || format!("kill({}, {}) failed", pid, signo))
}

/// Send `signo` to the calling thread with `raise(3)`
pub fn raise_signal<S: ErrorSink>(signo: c_int, sink: S) -> S::Output<()> {
    if unsafe { libc::raise(signo) } != 0 {
        return sink.fail(SystemError::last(), (), || format!("raise({}) failed", signo));
    }
    sink.succeed(())
}

/// Install a handler with `signal(2)`, returning the previous one
///
/// # Safety
///
/// The handler runs asynchronously and may only call async-signal-safe
/// functions.
pub unsafe fn set_signal_handler(signo: c_int, handler: SigHandler) -> Result<SigHandler> {
    let raw = handler_to_raw(handler);
    let previous = libc::signal(signo, raw);
    if previous == libc::SIG_ERR {
        return Throw.fail(SystemError::last(), SigHandler::SigDfl, || {
            format!("signal({}) failed", signo)
        });
    }
    Ok(raw_to_handler(previous, false))
}

fn handler_to_raw(handler: SigHandler) -> libc::sighandler_t {
    match handler {
        SigHandler::SigDfl => libc::SIG_DFL,
        SigHandler::SigIgn => libc::SIG_IGN,
        SigHandler::Handler(f) => f as libc::sighandler_t,
        SigHandler::SigAction(f) => f as libc::sighandler_t,
    }
}

fn raw_to_handler(raw: libc::sighandler_t, siginfo: bool) -> SigHandler {
    match raw {
        libc::SIG_DFL => SigHandler::SigDfl,
        libc::SIG_IGN => SigHandler::SigIgn,
        // SAFETY: any other value was installed as a function of the matching shape
        _ if siginfo => SigHandler::SigAction(unsafe {
            mem::transmute::<libc::sighandler_t, extern "C" fn(c_int, *mut libc::siginfo_t, *mut libc::c_void)>(raw)
        }),
        _ => SigHandler::Handler(unsafe { mem::transmute::<libc::sighandler_t, extern "C" fn(c_int)>(raw) }),
    }
}

/// Disposition of a signal (`struct sigaction`)
#[derive(Clone, Copy)]
pub struct SignalAction {
    action: libc::sigaction,
}

impl SignalAction {
    /// Action running `handler` with no flags and an empty mask
    pub fn new(handler: SigHandler) -> Self {
        Self::with_flags(handler, 0)
    }

    /// Action running `handler` with `flags`
    ///
    /// `SA_SIGINFO` is set for `SigHandler::SigAction` handlers and cleared
    /// for all others.
    pub fn with_flags(handler: SigHandler, flags: c_int) -> Self {
        let mut action: libc::sigaction = unsafe { mem::zeroed() };
        action.sa_sigaction = handler_to_raw(handler);
        action.sa_flags = match handler {
            SigHandler::SigAction(_) => flags | libc::SA_SIGINFO,
            _ => flags & !libc::SA_SIGINFO,
        };
        unsafe { libc::sigemptyset(&mut action.sa_mask) };
        Self { action }
    }

    pub fn set_mask(&mut self, mask: &SignalSet) {
        self.action.sa_mask = *mask.get();
    }

    pub fn handler(&self) -> SigHandler {
        raw_to_handler(self.action.sa_sigaction, self.action.sa_flags & libc::SA_SIGINFO != 0)
    }

    pub fn flags(&self) -> c_int {
        self.action.sa_flags
    }

    pub fn mask(&self) -> SignalSet {
        SignalSet::from(self.action.sa_mask)
    }

    pub fn as_raw(&self) -> &libc::sigaction {
        &self.action
    }
}

impl Default for SignalAction {
    fn default() -> Self {
        Self::new(SigHandler::SigDfl)
    }
}

impl fmt::Debug for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalAction")
            .field("handler", &self.handler())
            .field("flags", &format_args!("0x{:x}", self.flags()))
            .field("mask", &self.mask())
            .finish()
    }
}

/// Install `action` for `signo` with `sigaction(2)`
///
/// When `old` is given it receives the previous action.
///
/// # Safety
///
/// The handler runs asynchronously and may only call async-signal-safe
/// functions.
pub unsafe fn set_signal_action(signo: c_int, action: &SignalAction, old: Option<&mut SignalAction>) -> Result<()> {
    let old = old.map_or(ptr::null_mut(), |old| &mut old.action as *mut libc::sigaction);
    check_status(libc::sigaction(signo, &action.action, old), || {
        format!("sigaction({}) failed", signo)
    })
}

/// Current action for `signo`
pub fn get_signal_action(signo: c_int) -> Result<SignalAction> {
    let mut current = SignalAction::default();
    let ret = unsafe { libc::sigaction(signo, ptr::null(), &mut current.action) };
    check_status(ret, || format!("sigaction({}) failed", signo))?;
    Ok(current)
}

/// Change the calling thread's signal mask with `sigprocmask(2)`
pub fn set_signal_process_mask(how: SigmaskHow, set: &SignalSet, old: Option<&mut SignalSet>) -> Result<()> {
    let old = old.map_or(ptr::null_mut(), |old| old.get_mut() as *mut sigset_t);
    let ret = unsafe { libc::sigprocmask(how as c_int, set.get(), old) };
    check_status(ret, || format!("sigprocmask({:?},...) failed", how))
}

/// Calling thread's current signal mask
pub fn get_signal_process_mask() -> Result<SignalSet> {
    let mut current = SignalSet::none();
    let ret = unsafe { libc::sigprocmask(libc::SIG_SETMASK, ptr::null(), current.get_mut()) };
    check_status(ret, || "sigprocmask(SIG_SETMASK, nullptr, ...) failed".to_string())?;
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_system_errors::ErrorCode;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Mutex;

    // Handler tests share process-wide dispositions
    static HANDLER_LOCK: Mutex<()> = Mutex::new(());
    static HANDLED: AtomicI32 = AtomicI32::new(0);

    extern "C" fn record_signal(signo: c_int) {
        HANDLED.store(signo, Ordering::SeqCst);
    }

    extern "C" fn record_signal_info(signo: c_int, _info: *mut libc::siginfo_t, _ctx: *mut libc::c_void) {
        HANDLED.store(signo, Ordering::SeqCst);
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(libc::SIGINT), "INT");
        assert_eq!(signal_name(libc::SIGKILL), "KILL");
        assert_eq!(signal_name(0), "0");
        assert_eq!(signal_name(-3), "-3");
    }

    #[test]
    fn test_signal_message() {
        let message = signal_message(libc::SIGKILL, Throw).unwrap();
        assert!(!message.is_empty());
        let mut ec = ErrorCode::new();
        let _ = signal_message(libc::SIGTERM, &mut ec);
        assert!(!ec.failed());
    }

    #[test]
    fn test_signal_set_membership() {
        let mut set = SignalSet::new();
        assert!(!set.is_member(libc::SIGUSR1).unwrap());
        set.add(libc::SIGUSR1).unwrap();
        assert!(set.is_member(libc::SIGUSR1).unwrap());
        set.del(libc::SIGUSR1).unwrap();
        assert!(!set.is_member(libc::SIGUSR1).unwrap());
        assert!(SignalSet::all().is_member(libc::SIGTERM).unwrap());

        let err = set.add(100_000).unwrap_err();
        assert!(err.matches(libc::EINVAL));
    }

    #[test]
    fn test_simple_handler() {
        let _guard = HANDLER_LOCK.lock().unwrap();
        unsafe { set_signal_handler(libc::SIGUSR1, SigHandler::Handler(record_signal)) }.unwrap();
        HANDLED.store(0, Ordering::SeqCst);
        raise_signal(libc::SIGUSR1, Throw).unwrap();
        assert_eq!(HANDLED.load(Ordering::SeqCst), libc::SIGUSR1);
        let previous = unsafe { set_signal_handler(libc::SIGUSR1, SigHandler::SigDfl) }.unwrap();
        assert_eq!(previous, SigHandler::Handler(record_signal));
    }

    #[test]
    fn test_action_handler() {
        let _guard = HANDLER_LOCK.lock().unwrap();
        let action = SignalAction::new(SigHandler::SigAction(record_signal_info));
        assert_ne!(action.flags() & libc::SA_SIGINFO, 0);
        unsafe { set_signal_action(libc::SIGUSR2, &action, None) }.unwrap();

        HANDLED.store(0, Ordering::SeqCst);
        raise_signal(libc::SIGUSR2, Throw).unwrap();
        assert_eq!(HANDLED.load(Ordering::SeqCst), libc::SIGUSR2);

        let current = get_signal_action(libc::SIGUSR2).unwrap();
        assert_eq!(current.handler(), SigHandler::SigAction(record_signal_info));

        let mut old = SignalAction::default();
        unsafe { set_signal_action(libc::SIGUSR2, &SignalAction::new(SigHandler::SigDfl), Some(&mut old)) }.unwrap();
        assert_eq!(old.handler(), SigHandler::SigAction(record_signal_info));
        assert_eq!(get_signal_action(libc::SIGUSR2).unwrap().handler(), SigHandler::SigDfl);
    }

    #[test]
    fn test_action_mask_and_flags() {
        let mut mask = SignalSet::new();
        mask.add(libc::SIGINT).unwrap();
        let mut action = SignalAction::with_flags(SigHandler::Handler(record_signal), libc::SA_RESTART | libc::SA_SIGINFO);
        action.set_mask(&mask);
        assert_eq!(action.flags() & libc::SA_SIGINFO, 0);
        assert_ne!(action.flags() & libc::SA_RESTART, 0);
        assert!(action.mask().is_member(libc::SIGINT).unwrap());
    }

    #[test]
    fn test_process_mask_round_trip() {
        // The mask is per thread; this test thread owns it
        let mut blocked = SignalSet::new();
        blocked.add(libc::SIGUSR2).unwrap();
        let mut old = SignalSet::new();
        set_signal_process_mask(SigmaskHow::SIG_BLOCK, &blocked, Some(&mut old)).unwrap();
        assert!(get_signal_process_mask().unwrap().is_member(libc::SIGUSR2).unwrap());
        set_signal_process_mask(SigmaskHow::SIG_SETMASK, &old, None).unwrap();
        assert!(!get_signal_process_mask().unwrap().is_member(libc::SIGUSR2).unwrap());
    }

    #[test]
    fn test_send_signal_to_missing_process() {
        let mut ec = ErrorCode::new();
        // pid_t::MAX is never a live process
        send_signal(libc::pid_t::MAX, 0, &mut ec);
        assert!(ec.matches(libc::ESRCH));
        send_signal(unsafe { libc::getpid() }, 0, &mut ec);
        assert!(!ec.failed());
    }
}
