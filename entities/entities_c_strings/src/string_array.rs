//! C String Arrays
//!
//! Provides [`CStringArray`], the contiguous null-terminated array of
//! `const char *` that `exec*` and `posix_spawn*` take as `argv` and `envp`.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::ptr;

use libc::c_char;

use entities_system_errors::SystemError;

use crate::c_path::CStrLike;

enum Pointers<'a> {
    /// Caller's array, already null-terminated
    Borrowed(&'a [*const c_char]),
    /// Our own array, terminator included
    Owned(Vec<*const c_char>),
}

/// Null-terminated array of C string pointers
///
/// Built either from a sequence of string-like values, which are copied into
/// owned storage, or from an existing pointer array, which is aliased when it
/// already carries its terminator.
pub struct CStringArray<'a> {
    pointers: Pointers<'a>,
    // Backing storage for pointers built by `new`
    _strings: Vec<CString>,
    _marker: PhantomData<&'a CStr>,
}

impl<'a> CStringArray<'a> {
    /// Build an array from string-like values
    ///
    /// # Returns
    ///
    /// The array, or `EINVAL` if any item contains an interior NUL.
    ///
    /// # Examples
    ///
    /// ```
    /// use entities_c_strings::CStringArray;
    ///
    /// let args = CStringArray::new(["sh", "-c", "true"]).unwrap();
    /// assert_eq!(args.len(), 3);
    /// assert_eq!(args.get(1).unwrap().to_bytes(), b"-c");
    /// ```
    pub fn new<I>(items: I) -> Result<Self, SystemError>
    where
        I: IntoIterator,
        I::Item: CStrLike,
    {
        let strings = items
            .into_iter()
            .map(|item| item.c_str().map(|s| s.into_owned()))
            .collect::<Result<Vec<CString>, SystemError>>()?;
        let mut pointers = Vec::with_capacity(strings.len() + 1);
        pointers.extend(strings.iter().map(|s| s.as_ptr()));
        pointers.push(ptr::null());
        Ok(Self {
            pointers: Pointers::Owned(pointers),
            _strings: strings,
            _marker: PhantomData,
        })
    }

    /// Array of `NAME=value` entries for the calling process's environment
    pub fn environment() -> Result<Self, SystemError> {
        Self::new(std::env::vars_os().map(|(name, value)| {
            let mut entry = name;
            entry.push("=");
            entry.push(value);
            entry
        }))
    }

    /// Adopt an existing pointer array
    ///
    /// A slice whose last element is null is aliased without copying; any
    /// other slice is copied and terminated.
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `pointers` must point to a valid
    /// NUL-terminated string that outlives `'a`.
    pub unsafe fn from_pointers(pointers: &'a [*const c_char]) -> Self {
        let pointers = match pointers.last() {
            Some(last) if last.is_null() => Pointers::Borrowed(pointers),
            _ => {
                let mut copy = Vec::with_capacity(pointers.len() + 1);
                copy.extend_from_slice(pointers);
                copy.push(ptr::null());
                Pointers::Owned(copy)
            }
        };
        Self {
            pointers,
            _strings: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn slice(&self) -> &[*const c_char] {
        match &self.pointers {
            Pointers::Borrowed(pointers) => pointers,
            Pointers::Owned(pointers) => pointers,
        }
    }

    /// Pointer to the first element, as passed to the system call
    pub fn as_ptr(&self) -> *const *const c_char {
        self.slice().as_ptr()
    }

    /// True if the array aliases the caller's storage
    pub fn is_borrowed(&self) -> bool {
        matches!(self.pointers, Pointers::Borrowed(_))
    }

    /// Number of strings, not counting the terminator
    pub fn len(&self) -> usize {
        self.slice().len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// String at `index`, or `None` past the end or at a null entry
    pub fn get(&self, index: usize) -> Option<&CStr> {
        let pointer = *self.slice()[..self.len()].get(index)?;
        if pointer.is_null() {
            return None;
        }
        // SAFETY: owned pointers come from `_strings`; adopted ones are valid
        // per the contract of `from_pointers`.
        Some(unsafe { CStr::from_ptr(pointer) })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CStr> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

impl std::fmt::Debug for CStringArray<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
