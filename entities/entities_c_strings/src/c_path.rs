//! Path and String Adaptation
//!
//! Provides [`CPath`] for anything accepted where a path is expected and
//! [`CStrLike`] for plain strings. Inputs that are already NUL-terminated are
//! borrowed as they are; everything else gets a temporary terminated copy.
//! A NUL byte in the middle of the input cannot be represented and is
//! reported as `EINVAL`.

use std::borrow::Cow;
use std::ffi::{CStr, CString, OsStr, OsString};
use std::path::{Path, PathBuf};

use entities_system_errors::SystemError;

/// Value usable as a file system path in a system call
pub trait CPath {
    fn c_path(&self) -> Result<Cow<'_, CStr>, SystemError>;
}

/// Value usable as a C string in a system call
pub trait CStrLike {
    fn c_str(&self) -> Result<Cow<'_, CStr>, SystemError>;
}

/// Borrow `bytes` if they already end in the only NUL, copy them otherwise
pub(crate) fn bytes_to_c_str(bytes: &[u8]) -> Result<Cow<'_, CStr>, SystemError> {
    if let Ok(terminated) = CStr::from_bytes_with_nul(bytes) {
        return Ok(Cow::Borrowed(terminated));
    }
    CString::new(bytes)
        .map(Cow::Owned)
        .map_err(|_| SystemError::posix(libc::EINVAL))
}

#[cfg(unix)]
fn os_str_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(s.as_bytes())
}

#[cfg(not(unix))]
fn os_str_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    match s.to_string_lossy() {
        Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
        Cow::Owned(text) => Cow::Owned(text.into_bytes()),
    }
}

fn os_str_to_c_str(s: &OsStr) -> Result<Cow<'_, CStr>, SystemError> {
    match os_str_bytes(s) {
        Cow::Borrowed(bytes) => bytes_to_c_str(bytes),
        Cow::Owned(bytes) => CString::new(bytes)
            .map(Cow::Owned)
            .map_err(|_| SystemError::posix(libc::EINVAL)),
    }
}

macro_rules! impl_c_conversions {
    ($($ty:ty => |$s:ident| $body:expr;)+) => {
        $(
            impl CPath for $ty {
                fn c_path(&self) -> Result<Cow<'_, CStr>, SystemError> {
                    let $s = self;
                    $body
                }
            }

            impl CStrLike for $ty {
                fn c_str(&self) -> Result<Cow<'_, CStr>, SystemError> {
                    let $s = self;
                    $body
                }
            }
        )+
    };
}

impl_c_conversions! {
    CStr => |s| Ok(Cow::Borrowed(s));
    CString => |s| Ok(Cow::Borrowed(s.as_c_str()));
    str => |s| bytes_to_c_str(s.as_bytes());
    String => |s| bytes_to_c_str(s.as_bytes());
    OsStr => |s| os_str_to_c_str(s);
    OsString => |s| os_str_to_c_str(s.as_os_str());
}

impl CPath for Path {
    fn c_path(&self) -> Result<Cow<'_, CStr>, SystemError> {
        os_str_to_c_str(self.as_os_str())
    }
}

impl CPath for PathBuf {
    fn c_path(&self) -> Result<Cow<'_, CStr>, SystemError> {
        os_str_to_c_str(self.as_os_str())
    }
}

impl<T: CPath + ?Sized> CPath for &T {
    fn c_path(&self) -> Result<Cow<'_, CStr>, SystemError> {
        (**self).c_path()
    }
}

impl<T: CStrLike + ?Sized> CStrLike for &T {
    fn c_str(&self) -> Result<Cow<'_, CStr>, SystemError> {
        (**self).c_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_borrowed(value: &Cow<'_, CStr>) -> bool {
        matches!(value, Cow::Borrowed(_))
    }

    #[test]
    fn test_terminated_inputs_are_borrowed() {
        let owned = CString::new("/tmp").unwrap();
        assert!(is_borrowed(&owned.c_path().unwrap()));
        assert!(is_borrowed(&owned.as_c_str().c_path().unwrap()));
        assert!(is_borrowed(&"/tmp\0".c_path().unwrap()));
    }

    #[test]
    fn test_plain_inputs_are_copied() {
        let path = "/tmp".c_path().unwrap();
        assert!(!is_borrowed(&path));
        assert_eq!(path.to_bytes(), b"/tmp");

        let buf = PathBuf::from("/var/log");
        assert_eq!(buf.c_path().unwrap().to_bytes(), b"/var/log");
        assert_eq!(buf.as_path().c_path().unwrap().to_bytes(), b"/var/log");

        let os = OsString::from("name");
        assert_eq!(os.c_str().unwrap().to_bytes(), b"name");
        assert_eq!(String::from("x").c_str().unwrap().to_bytes(), b"x");
    }

    #[test]
    fn test_interior_nul_is_invalid() {
        let err = "a\0b".c_path().unwrap_err();
        assert!(err.matches(libc::EINVAL));
        assert!("a\0b\0".c_str().is_err());
        assert!(Path::new("dir\0/file").c_path().is_err());
    }

    #[test]
    fn test_references_delegate() {
        let s = String::from("abc");
        let r = &&s;
        assert_eq!(r.c_str().unwrap().to_bytes(), b"abc");
        assert_eq!((&s).c_path().unwrap().to_bytes(), b"abc");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!("".c_path().unwrap().to_bytes(), b"");
    }
}
