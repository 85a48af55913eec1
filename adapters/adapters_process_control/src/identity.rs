//! Identity Module
//!
//! Provides the process's user/group identity and its supplementary group
//! list.

use log::trace;
use nix::unistd::{Gid, Uid};

use entities_system_errors::{ErrorSink, SystemError};

/// User and group id pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: Uid,
    pub gid: Gid,
}

impl Identity {
    pub fn new(uid: Uid, gid: Gid) -> Self {
        Self { uid, gid }
    }

    /// Real user and group ids of the calling process
    pub fn real() -> Self {
        Self::new(Uid::current(), Gid::current())
    }

    /// Effective user and group ids of the calling process
    pub fn effective() -> Self {
        Self::new(Uid::effective(), Gid::effective())
    }

    /// Become this identity with `setgid(2)` then `setuid(2)`
    ///
    /// The group is changed first, while the process may still have the
    /// privilege to do so.
    pub fn set_real<S: ErrorSink>(&self, sink: S) -> S::Output<()> {
        if unsafe { libc::setgid(self.gid.as_raw()) } != 0 {
            return sink.fail(SystemError::last(), (), || format!("setgid({}) failed", self.gid));
        }
        if unsafe { libc::setuid(self.uid.as_raw()) } != 0 {
            return sink.fail(SystemError::last(), (), || format!("setuid({}) failed", self.uid));
        }
        sink.succeed(())
    }

    /// Make this identity effective with `setegid(2)` then `seteuid(2)`
    pub fn set_effective<S: ErrorSink>(&self, sink: S) -> S::Output<()> {
        if unsafe { libc::setegid(self.gid.as_raw()) } != 0 {
            return sink.fail(SystemError::last(), (), || format!("setegid({}) failed", self.gid));
        }
        if unsafe { libc::seteuid(self.uid.as_raw()) } != 0 {
            return sink.fail(SystemError::last(), (), || format!("seteuid({}) failed", self.uid));
        }
        sink.succeed(())
    }
}

/// Supplementary group ids of the calling process, from `getgroups(2)`
///
/// The list is sized first and then filled; if it grows between the two
/// calls the query is repeated.
pub fn get_groups<S: ErrorSink>(sink: S) -> S::Output<Vec<Gid>> {
    query_groups(|size, list| unsafe { libc::getgroups(size, list) }, sink)
}

fn query_groups<Q, S>(mut query: Q, sink: S) -> S::Output<Vec<Gid>>
where
    Q: FnMut(libc::c_int, *mut libc::gid_t) -> libc::c_int,
    S: ErrorSink,
{
    loop {
        let count = query(0, std::ptr::null_mut());
        if count < 0 {
            return sink.fail(SystemError::last(), Vec::new(), || "getgroups(0, nullptr) failed".to_string());
        }
        let mut groups: Vec<libc::gid_t> = vec![0; count as usize];
        let filled = query(count, groups.as_mut_ptr());
        if filled < 0 {
            let err = SystemError::last();
            if err.matches(libc::EINVAL) {
                trace!("group list grew past {} entries, retrying", count);
                continue;
            }
            return sink.fail(err, Vec::new(), || format!("getgroups({}) failed", count));
        }
        // A zero-sized buffer only queries the count again
        if filled > count {
            trace!("group list grew from {} to {} entries, retrying", count, filled);
            continue;
        }
        groups.truncate(filled as usize);
        return sink.succeed(groups.into_iter().map(Gid::from_raw).collect());
    }
}

/// Replace the supplementary group list with `setgroups(2)`
pub fn set_groups<S: ErrorSink>(groups: &[Gid], sink: S) -> S::Output<()> {
    let raw: Vec<libc::gid_t> = groups.iter().map(|gid| gid.as_raw()).collect();
    let ret = unsafe { libc::setgroups(raw.len() as _, raw.as_ptr()) };
    sink.from_status(ret, || format!("setgroups({}) failed", raw.len()))
}
