// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Named Win32 file mapping backed by the paging file.

use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
use windows::Win32::System::Memory::{
    CreateFileMappingW, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, FILE_MAP,
    FILE_MAP_ALL_ACCESS, FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, PAGE_READWRITE,
};

use crate::core::{ExportError, Result};

/// A named file mapping with a view mapped into this process.
pub struct NamedMapping {
    mapping: HANDLE,
    view: MEMORY_MAPPED_VIEW_ADDRESS,
    len: usize,
}

// SAFETY: mapping handles and views have no thread affinity; all access goes
// through volatile reads/writes of whole aligned words.
unsafe impl Send for NamedMapping {}

impl NamedMapping {
    /// Create the mapping, or open it if another process already did, and map it read-write.
    pub fn create(name: &str, len: usize) -> Result<Self> {
        let wide = HSTRING::from(name);
        let mapping = unsafe {
            CreateFileMappingW(
                INVALID_HANDLE_VALUE,
                None,
                PAGE_READWRITE,
                0,
                len as u32,
                PCWSTR(wide.as_ptr()),
            )
        }
        .map_err(|e| shared_memory_error("mapping creation", &e))?;

        Self::map(mapping, FILE_MAP_ALL_ACCESS, len)
    }

    /// Open an existing mapping read-only.
    pub fn open_read_only(name: &str, len: usize) -> Result<Self> {
        let wide = HSTRING::from(name);
        let mapping = unsafe { OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR(wide.as_ptr())) }
            .map_err(|e| shared_memory_error("mapping open", &e))?;

        Self::map(mapping, FILE_MAP_READ, len)
    }

    fn map(mapping: HANDLE, access: FILE_MAP, len: usize) -> Result<Self> {
        let view = unsafe { MapViewOfFile(mapping, access, 0, 0, len) };
        if view.Value.is_null() {
            let err = ExportError::last_os_error("view mapping");
            let _ = unsafe { CloseHandle(mapping) };
            return Err(err);
        }
        Ok(Self { mapping, view, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn write_u64(&self, offset: usize, value: u64) {
        assert!(offset % 8 == 0 && offset + 8 <= self.len);
        // SAFETY: bounds and alignment checked above; the view is writable.
        unsafe {
            std::ptr::write_volatile(self.view.Value.cast::<u8>().add(offset).cast::<u64>(), value)
        }
    }

    pub fn read_u64(&self, offset: usize) -> u64 {
        assert!(offset % 8 == 0 && offset + 8 <= self.len);
        // SAFETY: bounds and alignment checked above.
        unsafe { std::ptr::read_volatile(self.view.Value.cast::<u8>().add(offset).cast::<u64>()) }
    }
}

impl Drop for NamedMapping {
    fn drop(&mut self) {
        unsafe {
            let _ = UnmapViewOfFile(self.view);
            let _ = CloseHandle(self.mapping);
        }
    }
}

fn shared_memory_error(operation: &'static str, error: &windows::core::Error) -> ExportError {
    tracing::debug!("NamedMapping: {} failed: {}", operation, error.message());
    ExportError::SharedMemory {
        operation,
        code: i64::from(error.code().0),
    }
}
