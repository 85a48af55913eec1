//! Memory Map Module
//!
//! Provides [`MemoryMap`], the owning wrapper of a region created by
//! `mmap(2)`. An empty map holds a null address and zero length; dropping a
//! bound map unmaps it exactly once.

use std::ptr;

use libc::c_void;
use log::trace;
use nix::sys::mman::{MapFlags, ProtFlags};

use entities_system_errors::{ErrorSink, SystemError};

use crate::descriptor::FileDescriptorLike;

/// Owning wrapper of a memory mapping
#[derive(Debug)]
pub struct MemoryMap {
    addr: *mut c_void,
    len: usize,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self {
            addr: ptr::null_mut(),
            len: 0,
        }
    }
}

impl MemoryMap {
    /// Map `len` bytes of `fd` starting at `offset`
    ///
    /// # Arguments
    ///
    /// * `addr_hint` - Preferred address, or null to let the system choose
    /// * `len` - Length of the mapping in bytes
    /// * `prot` - `PROT_*` protection flags
    /// * `flags` - `MAP_*` flags
    /// * `fd` - Mapped file; `-1` for anonymous mappings
    /// * `offset` - Offset in the file, a multiple of the page size
    /// * `sink` - Error sink
    pub fn map<F: FileDescriptorLike, S: ErrorSink>(
        addr_hint: *mut c_void,
        len: usize,
        prot: ProtFlags,
        flags: MapFlags,
        fd: F,
        offset: libc::off_t,
        sink: S,
    ) -> S::Output<MemoryMap> {
        let fd = fd.c_fd();
        let addr = unsafe { libc::mmap(addr_hint, len, prot.bits(), flags.bits(), fd, offset) };
        if addr == libc::MAP_FAILED {
            return sink.fail(SystemError::last(), MemoryMap::default(), || {
                format!(
                    "mmap({:p}, {}, 0x{:x}, 0x{:x}, {}, {}) failed",
                    addr_hint,
                    len,
                    prot.bits(),
                    flags.bits(),
                    fd,
                    offset
                )
            });
        }
        sink.succeed(MemoryMap { addr, len })
    }

    /// Take ownership of an existing mapping
    ///
    /// # Safety
    ///
    /// `addr` and `len` must describe a mapping created by `mmap` that
    /// nothing else will unmap.
    pub unsafe fn from_raw(addr: *mut c_void, len: usize) -> Self {
        Self { addr, len }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.addr
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        self.addr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_valid(&self) -> bool {
        !self.addr.is_null()
    }

    /// View the mapping as bytes
    ///
    /// # Safety
    ///
    /// The mapping must be readable and must not be modified through another
    /// alias while the slice is alive.
    pub unsafe fn as_slice(&self) -> &[u8] {
        if self.addr.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(self.addr.cast(), self.len)
    }

    /// View the mapping as mutable bytes
    ///
    /// # Safety
    ///
    /// The mapping must be writable and must not be accessed through another
    /// alias while the slice is alive.
    pub unsafe fn as_mut_slice(&mut self) -> &mut [u8] {
        if self.addr.is_null() {
            return &mut [];
        }
        std::slice::from_raw_parts_mut(self.addr.cast(), self.len)
    }

    /// Give up ownership without unmapping
    pub fn release(&mut self) -> (*mut c_void, usize) {
        let released = (self.addr, self.len);
        self.addr = ptr::null_mut();
        self.len = 0;
        released
    }

    /// Unmap the region; a no-op on an empty map
    pub fn unmap(&mut self) {
        if !self.addr.is_null() {
            trace!("unmapping {:p} ({} bytes)", self.addr, self.len);
            unsafe { libc::munmap(self.addr, self.len) };
            self.addr = ptr::null_mut();
            self.len = 0;
        }
    }
}

impl Drop for MemoryMap {
    fn drop(&mut self) {
        self.unmap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_system_errors::{ErrorCode, Throw};

    #[test]
    fn test_anonymous_mapping_is_writable() {
        let mut map = MemoryMap::map(
            ptr::null_mut(),
            4096,
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            MapFlags::MAP_PRIVATE | MapFlags::MAP_ANONYMOUS,
            -1,
            0,
            Throw,
        )
        .unwrap();
        assert!(map.is_valid());
        assert_eq!(map.len(), 4096);
        unsafe {
            map.as_mut_slice()[..3].copy_from_slice(b"abc");
            assert_eq!(&map.as_slice()[..3], b"abc");
        }
    }

    #[test]
    fn test_failed_mapping_is_empty() {
        let mut ec = ErrorCode::new();
        let map = MemoryMap::map(
            ptr::null_mut(),
            4096,
            ProtFlags::PROT_READ,
            MapFlags::MAP_SHARED,
            -1,
            0,
            &mut ec,
        );
        assert!(ec.failed());
        assert!(!map.is_valid());
        assert!(map.is_empty());
        assert!(unsafe { map.as_slice() }.is_empty());
    }

    #[test]
    fn test_take_and_unmap() {
        let mut map = MemoryMap::map(
            ptr::null_mut(),
            4096,
            ProtFlags::PROT_READ,
            MapFlags::MAP_PRIVATE | MapFlags::MAP_ANONYMOUS,
            -1,
            0,
            Throw,
        )
        .unwrap();
        let addr = map.as_ptr();
        let mut taken = std::mem::take(&mut map);
        assert!(!map.is_valid());
        assert_eq!(taken.as_ptr(), addr);
        taken.unmap();
        assert!(!taken.is_valid());
        taken.unmap();
    }
}
