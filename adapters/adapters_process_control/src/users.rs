//! Users Database Module
//!
//! Provides lookups in the user (`getpwnam_r`/`getpwuid_r`) and group
//! (`getgrnam_r`/`getgrgid_r`) databases.
//!
//! A missing entry is not an error: the lookups return `None`. The record's
//! strings live in a buffer owned by the returned value; it starts at the
//! size suggested by `sysconf` and grows by 4096 bytes whenever the system
//! reports `ERANGE`.

use std::ffi::CStr;
use std::fmt;
use std::mem;
use std::ptr;

use lazy_static::lazy_static;
use libc::{c_char, c_int};
use log::trace;
use nix::unistd::{Gid, Uid};

use entities_c_strings::CStrLike;
use entities_system_errors::{sink_try, ErrorCode, ErrorSink, SystemError};

use crate::system::system_config;

const BUFFER_INCREMENT: usize = 4096;

fn configured_buffer_size(name: c_int) -> usize {
    system_config(name, &mut ErrorCode::new())
        .and_then(|size| usize::try_from(size).ok())
        .filter(|&size| size > 0)
        .unwrap_or(BUFFER_INCREMENT)
}

lazy_static! {
    static ref PASSWD_BUFFER_SIZE: usize = configured_buffer_size(libc::_SC_GETPW_R_SIZE_MAX);
    static ref GROUP_BUFFER_SIZE: usize = configured_buffer_size(libc::_SC_GETGR_R_SIZE_MAX);
}

// SAFETY (callers): `ptr` is null or points into a record buffer that outlives 'a
unsafe fn field<'a>(ptr: *const c_char) -> &'a CStr {
    if ptr.is_null() {
        return Default::default();
    }
    CStr::from_ptr(ptr)
}

/// Run a reentrant database lookup, growing the buffer on `ERANGE`
fn lookup<R, T, S, F, B, M>(start_size: usize, sink: S, mut call: F, build: B, message: M) -> S::Output<Option<T>>
where
    S: ErrorSink,
    F: FnMut(&mut R, &mut [c_char], &mut *mut R) -> c_int,
    B: FnOnce(R, Vec<c_char>) -> T,
    M: FnOnce() -> String,
{
    let mut buf: Vec<c_char> = vec![0; start_size];
    loop {
        // SAFETY: the C record types are plain data
        let mut record: R = unsafe { mem::zeroed() };
        let mut result: *mut R = ptr::null_mut();
        let ret = call(&mut record, &mut buf, &mut result);
        if ret == 0 {
            if result.is_null() {
                return sink.succeed(None);
            }
            return sink.succeed(Some(build(record, buf)));
        }
        if ret != libc::ERANGE {
            return sink.fail(SystemError::posix(ret), None, message);
        }
        trace!("record buffer of {} bytes too small, growing", buf.len());
        buf.resize(buf.len() + BUFFER_INCREMENT, 0);
    }
}

/// Entry of the user database
pub struct Passwd {
    record: libc::passwd,
    _buf: Vec<c_char>,
}

impl Passwd {
    /// Look up a user by login name
    pub fn by_name<N: CStrLike, S: ErrorSink>(name: N, sink: S) -> S::Output<Option<Passwd>> {
        let c_name = sink_try!(sink, name.c_str(), None, "getpwnam_r: name contains NUL");
        lookup(
            *PASSWD_BUFFER_SIZE,
            sink,
            |record: &mut libc::passwd, buf: &mut [c_char], result: &mut *mut libc::passwd| unsafe {
                libc::getpwnam_r(c_name.as_ptr(), record, buf.as_mut_ptr(), buf.len(), result)
            },
            Passwd::from_parts,
            || format!("getpwnam_r({}) failed", c_name.to_string_lossy()),
        )
    }

    /// Look up a user by id
    pub fn by_id<S: ErrorSink>(uid: Uid, sink: S) -> S::Output<Option<Passwd>> {
        lookup(
            *PASSWD_BUFFER_SIZE,
            sink,
            |record: &mut libc::passwd, buf: &mut [c_char], result: &mut *mut libc::passwd| unsafe {
                libc::getpwuid_r(uid.as_raw(), record, buf.as_mut_ptr(), buf.len(), result)
            },
            Passwd::from_parts,
            || format!("getpwuid_r({}) failed", uid),
        )
    }

    fn from_parts(record: libc::passwd, buf: Vec<c_char>) -> Self {
        Self { record, _buf: buf }
    }

    pub fn name(&self) -> &CStr {
        unsafe { field(self.record.pw_name) }
    }

    pub fn passwd(&self) -> &CStr {
        unsafe { field(self.record.pw_passwd) }
    }

    pub fn uid(&self) -> Uid {
        Uid::from_raw(self.record.pw_uid)
    }

    pub fn gid(&self) -> Gid {
        Gid::from_raw(self.record.pw_gid)
    }

    pub fn gecos(&self) -> &CStr {
        unsafe { field(self.record.pw_gecos) }
    }

    pub fn dir(&self) -> &CStr {
        unsafe { field(self.record.pw_dir) }
    }

    pub fn shell(&self) -> &CStr {
        unsafe { field(self.record.pw_shell) }
    }

    pub fn as_raw(&self) -> &libc::passwd {
        &self.record
    }
}

impl fmt::Debug for Passwd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passwd")
            .field("name", &self.name())
            .field("uid", &self.uid())
            .field("gid", &self.gid())
            .field("dir", &self.dir())
            .field("shell", &self.shell())
            .finish()
    }
}

/// Entry of the group database
pub struct Group {
    record: libc::group,
    _buf: Vec<c_char>,
}

impl Group {
    /// Look up a group by name
    pub fn by_name<N: CStrLike, S: ErrorSink>(name: N, sink: S) -> S::Output<Option<Group>> {
        let c_name = sink_try!(sink, name.c_str(), None, "getgrnam_r: name contains NUL");
        lookup(
            *GROUP_BUFFER_SIZE,
            sink,
            |record: &mut libc::group, buf: &mut [c_char], result: &mut *mut libc::group| unsafe {
                libc::getgrnam_r(c_name.as_ptr(), record, buf.as_mut_ptr(), buf.len(), result)
            },
            Group::from_parts,
            || format!("getgrnam_r({}) failed", c_name.to_string_lossy()),
        )
    }

    /// Look up a group by id
    pub fn by_id<S: ErrorSink>(gid: Gid, sink: S) -> S::Output<Option<Group>> {
        lookup(
            *GROUP_BUFFER_SIZE,
            sink,
            |record: &mut libc::group, buf: &mut [c_char], result: &mut *mut libc::group| unsafe {
                libc::getgrgid_r(gid.as_raw(), record, buf.as_mut_ptr(), buf.len(), result)
            },
            Group::from_parts,
            || format!("getgrgid_r({}) failed", gid),
        )
    }

    fn from_parts(record: libc::group, buf: Vec<c_char>) -> Self {
        Self { record, _buf: buf }
    }

    pub fn name(&self) -> &CStr {
        unsafe { field(self.record.gr_name) }
    }

    pub fn passwd(&self) -> &CStr {
        unsafe { field(self.record.gr_passwd) }
    }

    pub fn gid(&self) -> Gid {
        Gid::from_raw(self.record.gr_gid)
    }

    /// Names of the group's members
    pub fn members(&self) -> Vec<&CStr> {
        let mut members = Vec::new();
        let mut cursor = self.record.gr_mem;
        if cursor.is_null() {
            return members;
        }
        unsafe {
            while !(*cursor).is_null() {
                members.push(field(*cursor));
                cursor = cursor.add(1);
            }
        }
        members
    }

    pub fn as_raw(&self) -> &libc::group {
        &self.record
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name())
            .field("gid", &self.gid())
            .field("members", &self.members())
            .finish()
    }
}
