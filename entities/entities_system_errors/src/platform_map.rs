//! Platform Error Translation
//!
//! Provides the fixed table translating Win32 and Winsock error codes into
//! POSIX `errno` values. Platform-domain errors are compared against POSIX
//! codes through this table; a code missing from the table matches nothing.

use std::collections::HashMap;

/// Win32 and Winsock error codes known to the translation table
pub mod win_error {
    pub const ERROR_INVALID_FUNCTION: i32 = 1;
    pub const ERROR_FILE_NOT_FOUND: i32 = 2;
    pub const ERROR_PATH_NOT_FOUND: i32 = 3;
    pub const ERROR_TOO_MANY_OPEN_FILES: i32 = 4;
    pub const ERROR_ACCESS_DENIED: i32 = 5;
    pub const ERROR_INVALID_HANDLE: i32 = 6;
    pub const ERROR_NOT_ENOUGH_MEMORY: i32 = 8;
    pub const ERROR_INVALID_ACCESS: i32 = 12;
    pub const ERROR_OUTOFMEMORY: i32 = 14;
    pub const ERROR_INVALID_DRIVE: i32 = 15;
    pub const ERROR_CURRENT_DIRECTORY: i32 = 16;
    pub const ERROR_NOT_SAME_DEVICE: i32 = 17;
    pub const ERROR_WRITE_PROTECT: i32 = 19;
    pub const ERROR_BAD_UNIT: i32 = 20;
    pub const ERROR_NOT_READY: i32 = 21;
    pub const ERROR_SEEK: i32 = 25;
    pub const ERROR_WRITE_FAULT: i32 = 29;
    pub const ERROR_READ_FAULT: i32 = 30;
    pub const ERROR_SHARING_VIOLATION: i32 = 32;
    pub const ERROR_LOCK_VIOLATION: i32 = 33;
    pub const ERROR_HANDLE_DISK_FULL: i32 = 39;
    pub const ERROR_NOT_SUPPORTED: i32 = 50;
    pub const ERROR_BAD_NETPATH: i32 = 53;
    pub const ERROR_DEV_NOT_EXIST: i32 = 55;
    pub const ERROR_BAD_NET_NAME: i32 = 67;
    pub const ERROR_FILE_EXISTS: i32 = 80;
    pub const ERROR_CANNOT_MAKE: i32 = 82;
    pub const ERROR_INVALID_PARAMETER: i32 = 87;
    pub const ERROR_BROKEN_PIPE: i32 = 109;
    pub const ERROR_OPEN_FAILED: i32 = 110;
    pub const ERROR_BUFFER_OVERFLOW: i32 = 111;
    pub const ERROR_DISK_FULL: i32 = 112;
    pub const ERROR_SEM_TIMEOUT: i32 = 121;
    pub const ERROR_INVALID_NAME: i32 = 123;
    pub const ERROR_NEGATIVE_SEEK: i32 = 131;
    pub const ERROR_BUSY_DRIVE: i32 = 142;
    pub const ERROR_DIR_NOT_EMPTY: i32 = 145;
    pub const ERROR_BUSY: i32 = 170;
    pub const ERROR_ALREADY_EXISTS: i32 = 183;
    pub const ERROR_FILENAME_EXCED_RANGE: i32 = 206;
    pub const ERROR_LOCKED: i32 = 212;
    pub const WAIT_TIMEOUT: i32 = 258;
    pub const ERROR_DIRECTORY: i32 = 267;
    pub const ERROR_OPERATION_ABORTED: i32 = 995;
    pub const ERROR_NOACCESS: i32 = 998;
    pub const ERROR_CANTOPEN: i32 = 1011;
    pub const ERROR_CANTREAD: i32 = 1012;
    pub const ERROR_CANTWRITE: i32 = 1013;
    pub const ERROR_RETRY: i32 = 1237;
    pub const ERROR_TIMEOUT: i32 = 1460;
    pub const ERROR_OPEN_FILES: i32 = 2401;
    pub const ERROR_DEVICE_IN_USE: i32 = 2404;
    pub const ERROR_REPARSE_TAG_INVALID: i32 = 4393;

    pub const WSAEINTR: i32 = 10004;
    pub const WSAEBADF: i32 = 10009;
    pub const WSAEACCES: i32 = 10013;
    pub const WSAEFAULT: i32 = 10014;
    pub const WSAEINVAL: i32 = 10022;
    pub const WSAEMFILE: i32 = 10024;
    pub const WSAEWOULDBLOCK: i32 = 10035;
    pub const WSAEINPROGRESS: i32 = 10036;
    pub const WSAEALREADY: i32 = 10037;
    pub const WSAENOTSOCK: i32 = 10038;
    pub const WSAEDESTADDRREQ: i32 = 10039;
    pub const WSAEMSGSIZE: i32 = 10040;
    pub const WSAEPROTOTYPE: i32 = 10041;
    pub const WSAENOPROTOOPT: i32 = 10042;
    pub const WSAEPROTONOSUPPORT: i32 = 10043;
    pub const WSAEOPNOTSUPP: i32 = 10045;
    pub const WSAEAFNOSUPPORT: i32 = 10047;
    pub const WSAEADDRINUSE: i32 = 10048;
    pub const WSAEADDRNOTAVAIL: i32 = 10049;
    pub const WSAENETDOWN: i32 = 10050;
    pub const WSAENETUNREACH: i32 = 10051;
    pub const WSAENETRESET: i32 = 10052;
    pub const WSAECONNABORTED: i32 = 10053;
    pub const WSAECONNRESET: i32 = 10054;
    pub const WSAENOBUFS: i32 = 10055;
    pub const WSAEISCONN: i32 = 10056;
    pub const WSAENOTCONN: i32 = 10057;
    pub const WSAETIMEDOUT: i32 = 10060;
    pub const WSAECONNREFUSED: i32 = 10061;
    pub const WSAENAMETOOLONG: i32 = 10063;
    pub const WSAEHOSTUNREACH: i32 = 10065;
}

use win_error::*;

/// `(platform code, POSIX errno)` pairs
pub const PLATFORM_ERROR_MAP: &[(i32, i32)] = &[
    (ERROR_INVALID_FUNCTION, libc::ENOSYS),
    (ERROR_FILE_NOT_FOUND, libc::ENOENT),
    (ERROR_PATH_NOT_FOUND, libc::ENOENT),
    (ERROR_TOO_MANY_OPEN_FILES, libc::EMFILE),
    (ERROR_ACCESS_DENIED, libc::EACCES),
    (ERROR_INVALID_HANDLE, libc::EINVAL),
    (ERROR_NOT_ENOUGH_MEMORY, libc::ENOMEM),
    (ERROR_INVALID_ACCESS, libc::EACCES),
    (ERROR_OUTOFMEMORY, libc::ENOMEM),
    (ERROR_INVALID_DRIVE, libc::ENODEV),
    (ERROR_CURRENT_DIRECTORY, libc::EACCES),
    (ERROR_NOT_SAME_DEVICE, libc::EXDEV),
    (ERROR_WRITE_PROTECT, libc::EACCES),
    (ERROR_BAD_UNIT, libc::ENODEV),
    (ERROR_NOT_READY, libc::EAGAIN),
    (ERROR_SEEK, libc::EIO),
    (ERROR_WRITE_FAULT, libc::EIO),
    (ERROR_READ_FAULT, libc::EIO),
    (ERROR_SHARING_VIOLATION, libc::EACCES),
    (ERROR_LOCK_VIOLATION, libc::ENOLCK),
    (ERROR_HANDLE_DISK_FULL, libc::ENOSPC),
    (ERROR_NOT_SUPPORTED, libc::ENOTSUP),
    (ERROR_BAD_NETPATH, libc::ENOENT),
    (ERROR_DEV_NOT_EXIST, libc::ENODEV),
    (ERROR_BAD_NET_NAME, libc::ENOENT),
    (ERROR_FILE_EXISTS, libc::EEXIST),
    (ERROR_CANNOT_MAKE, libc::EACCES),
    (ERROR_INVALID_PARAMETER, libc::EINVAL),
    (ERROR_BROKEN_PIPE, libc::EPIPE),
    (ERROR_OPEN_FAILED, libc::EIO),
    (ERROR_BUFFER_OVERFLOW, libc::ENAMETOOLONG),
    (ERROR_DISK_FULL, libc::ENOSPC),
    (ERROR_SEM_TIMEOUT, libc::ETIMEDOUT),
    (ERROR_INVALID_NAME, libc::ENOENT),
    (ERROR_NEGATIVE_SEEK, libc::EINVAL),
    (ERROR_BUSY_DRIVE, libc::EBUSY),
    (ERROR_DIR_NOT_EMPTY, libc::ENOTEMPTY),
    (ERROR_BUSY, libc::EBUSY),
    (ERROR_ALREADY_EXISTS, libc::EEXIST),
    (ERROR_FILENAME_EXCED_RANGE, libc::ENAMETOOLONG),
    (ERROR_LOCKED, libc::ENOLCK),
    (WAIT_TIMEOUT, libc::ETIMEDOUT),
    (ERROR_DIRECTORY, libc::EINVAL),
    (ERROR_OPERATION_ABORTED, libc::ECANCELED),
    (ERROR_NOACCESS, libc::EACCES),
    (ERROR_CANTOPEN, libc::EIO),
    (ERROR_CANTREAD, libc::EIO),
    (ERROR_CANTWRITE, libc::EIO),
    (ERROR_RETRY, libc::EAGAIN),
    (ERROR_TIMEOUT, libc::ETIMEDOUT),
    (ERROR_OPEN_FILES, libc::EBUSY),
    (ERROR_DEVICE_IN_USE, libc::EBUSY),
    (ERROR_REPARSE_TAG_INVALID, libc::EINVAL),
    (WSAEINTR, libc::EINTR),
    (WSAEBADF, libc::EBADF),
    (WSAEACCES, libc::EACCES),
    (WSAEFAULT, libc::EFAULT),
    (WSAEINVAL, libc::EINVAL),
    (WSAEMFILE, libc::EMFILE),
    (WSAEWOULDBLOCK, libc::EWOULDBLOCK),
    (WSAEINPROGRESS, libc::EINPROGRESS),
    (WSAEALREADY, libc::EALREADY),
    (WSAENOTSOCK, libc::ENOTSOCK),
    (WSAEDESTADDRREQ, libc::EDESTADDRREQ),
    (WSAEMSGSIZE, libc::EMSGSIZE),
    (WSAEPROTOTYPE, libc::EPROTOTYPE),
    (WSAENOPROTOOPT, libc::ENOPROTOOPT),
    (WSAEPROTONOSUPPORT, libc::EPROTONOSUPPORT),
    (WSAEOPNOTSUPP, libc::EOPNOTSUPP),
    (WSAEAFNOSUPPORT, libc::EAFNOSUPPORT),
    (WSAEADDRINUSE, libc::EADDRINUSE),
    (WSAEADDRNOTAVAIL, libc::EADDRNOTAVAIL),
    (WSAENETDOWN, libc::ENETDOWN),
    (WSAENETUNREACH, libc::ENETUNREACH),
    (WSAENETRESET, libc::ENETRESET),
    (WSAECONNABORTED, libc::ECONNABORTED),
    (WSAECONNRESET, libc::ECONNRESET),
    (WSAENOBUFS, libc::ENOBUFS),
    (WSAEISCONN, libc::EISCONN),
    (WSAENOTCONN, libc::ENOTCONN),
    (WSAETIMEDOUT, libc::ETIMEDOUT),
    (WSAECONNREFUSED, libc::ECONNREFUSED),
    (WSAENAMETOOLONG, libc::ENAMETOOLONG),
    (WSAEHOSTUNREACH, libc::EHOSTUNREACH),
];

lazy_static::lazy_static! {
    static ref PLATFORM_ERROR_INDEX: HashMap<i32, i32> =
        PLATFORM_ERROR_MAP.iter().copied().collect();
}

/// Translate a platform error code into its POSIX equivalent
///
/// # Arguments
///
/// * `platform_code` - Win32 or Winsock error code
///
/// # Returns
///
/// The POSIX `errno` value, or `None` if the code is not in the table.
///
/// # Examples
///
/// ```
/// use entities_system_errors::posix_equivalent;
///
/// assert_eq!(posix_equivalent(2), Some(libc::ENOENT));
/// assert_eq!(posix_equivalent(0), None);
/// ```
pub fn posix_equivalent(platform_code: i32) -> Option<i32> {
    PLATFORM_ERROR_INDEX.get(&platform_code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_no_duplicate_platform_codes() {
        assert_eq!(PLATFORM_ERROR_INDEX.len(), PLATFORM_ERROR_MAP.len());
    }

    #[test]
    fn test_file_errors() {
        assert_eq!(posix_equivalent(ERROR_FILE_NOT_FOUND), Some(libc::ENOENT));
        assert_eq!(posix_equivalent(ERROR_ACCESS_DENIED), Some(libc::EACCES));
        assert_eq!(posix_equivalent(ERROR_ALREADY_EXISTS), Some(libc::EEXIST));
        assert_eq!(posix_equivalent(ERROR_DIR_NOT_EMPTY), Some(libc::ENOTEMPTY));
        assert_eq!(posix_equivalent(WAIT_TIMEOUT), Some(libc::ETIMEDOUT));
    }

    #[test]
    fn test_socket_errors() {
        assert_eq!(posix_equivalent(WSAEWOULDBLOCK), Some(libc::EWOULDBLOCK));
        assert_eq!(posix_equivalent(WSAEADDRINUSE), Some(libc::EADDRINUSE));
        assert_eq!(posix_equivalent(WSAENOTSOCK), Some(libc::ENOTSOCK));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(posix_equivalent(0), None);
        assert_eq!(posix_equivalent(-1), None);
        assert_eq!(posix_equivalent(10000), None);
    }
}
