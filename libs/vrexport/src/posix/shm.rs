// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Named POSIX shared memory (`shm_open` + `mmap`).

use std::ffi::CString;

use crate::core::{ExportError, Result};

/// A named shared-memory object mapped into this process.
pub struct NamedMapping {
    ptr: *mut u8,
    len: usize,
}

// SAFETY: the mapping is plain shared memory with no thread affinity; all
// access goes through volatile reads/writes of whole aligned words.
unsafe impl Send for NamedMapping {}

impl NamedMapping {
    /// Create the object if needed (reusing an existing one) and map it read-write.
    pub fn create(name: &str, len: usize) -> Result<Self> {
        let c_name = shm_name(name)?;

        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_RDWR,
                0o600 as libc::c_uint,
            )
        };
        if fd < 0 {
            return Err(ExportError::last_os_error("mapping creation"));
        }

        let result =
            ensure_len(fd, len).and_then(|()| map(fd, len, libc::PROT_READ | libc::PROT_WRITE));
        unsafe { libc::close(fd) };
        result
    }

    /// Map an existing object read-only. Fails if it is smaller than `len`.
    pub fn open_read_only(name: &str, len: usize) -> Result<Self> {
        let c_name = shm_name(name)?;

        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDONLY, 0 as libc::c_uint) };
        if fd < 0 {
            return Err(ExportError::last_os_error("mapping open"));
        }

        let result = match object_len(fd) {
            Ok(existing) if existing < len => Err(ExportError::SharedMemory {
                operation: "mapping open",
                code: i64::from(libc::EINVAL),
            }),
            Ok(_) => map(fd, len, libc::PROT_READ),
            Err(e) => Err(e),
        };
        unsafe { libc::close(fd) };
        result
    }

    /// Remove the name. Existing mappings stay valid until unmapped.
    pub fn unlink(name: &str) -> Result<()> {
        let c_name = shm_name(name)?;
        if unsafe { libc::shm_unlink(c_name.as_ptr()) } != 0 {
            return Err(ExportError::last_os_error("unlink"));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn write_u64(&self, offset: usize, value: u64) {
        assert!(offset % 8 == 0 && offset + 8 <= self.len);
        // SAFETY: bounds and alignment checked above; the region is writable.
        unsafe { std::ptr::write_volatile(self.ptr.add(offset).cast::<u64>(), value) }
    }

    pub fn read_u64(&self, offset: usize) -> u64 {
        assert!(offset % 8 == 0 && offset + 8 <= self.len);
        // SAFETY: bounds and alignment checked above.
        unsafe { std::ptr::read_volatile(self.ptr.add(offset).cast::<u64>()) }
    }
}

impl Drop for NamedMapping {
    fn drop(&mut self) {
        unsafe { libc::munmap(self.ptr.cast(), self.len) };
    }
}

fn shm_name(name: &str) -> Result<CString> {
    let name = if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{}", name)
    };
    CString::new(name)
        .map_err(|e| ExportError::Configuration(format!("Invalid shared memory name: {}", e)))
}

fn object_len(fd: libc::c_int) -> Result<usize> {
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    if unsafe { libc::fstat(fd, &mut stat) } != 0 {
        return Err(ExportError::last_os_error("fstat"));
    }
    Ok(stat.st_size as usize)
}

fn ensure_len(fd: libc::c_int, len: usize) -> Result<()> {
    // Never shrink: a consumer may have created the object with a larger layout.
    if object_len(fd)? < len && unsafe { libc::ftruncate(fd, len as libc::off_t) } != 0 {
        return Err(ExportError::last_os_error("mapping resize"));
    }
    Ok(())
}

fn map(fd: libc::c_int, len: usize, prot: libc::c_int) -> Result<NamedMapping> {
    let ptr = unsafe { libc::mmap(std::ptr::null_mut(), len, prot, libc::MAP_SHARED, fd, 0) };
    if ptr == libc::MAP_FAILED {
        return Err(ExportError::last_os_error("view mapping"));
    }
    Ok(NamedMapping {
        ptr: ptr.cast(),
        len,
    })
}
