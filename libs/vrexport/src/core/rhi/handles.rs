// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Opaque native handles passed across the host boundary.
//!
//! The host hands over raw COM pointers as pointer-width integers. They are
//! borrowed, never owned: the host may invalidate them at any time.

use std::fmt;

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u64);

        impl $name {
            pub const NULL: Self = Self(0);

            pub fn is_null(&self) -> bool {
                self.0 == 0
            }

            pub fn from_ptr<T>(ptr: *const T) -> Self {
                Self(ptr as usize as u64)
            }

            pub fn as_ptr(&self) -> *mut std::ffi::c_void {
                self.0 as usize as *mut std::ffi::c_void
            }
        }
    };
}

native_handle!(
    /// Native graphics device (`ID3D11Device*` / `ID3D12Device*`).
    DeviceHandle
);
native_handle!(
    /// Native GPU resource (`ID3D11Texture2D*` / `ID3D12Resource*`).
    ResourceHandle
);
native_handle!(
    /// Native resource view handle as the host's binding API reports it.
    ResourceViewHandle
);

/// OS-level handle another process uses to open the shared resource.
///
/// Written to the publication channel in native-endian form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShareHandle(pub u64);

impl ShareHandle {
    pub fn to_ne_bytes(self) -> [u8; 8] {
        self.0.to_ne_bytes()
    }

    pub fn from_ne_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_ne_bytes(bytes))
    }
}

impl fmt::Debug for ShareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareHandle({:#x})", self.0)
    }
}

impl fmt::Display for ShareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles() {
        assert!(ResourceHandle::NULL.is_null());
        assert!(!DeviceHandle(0x1000).is_null());
    }

    #[test]
    fn share_handle_formats_as_hex() {
        assert_eq!(ShareHandle(0x4c2).to_string(), "0x4c2");
        assert_eq!(format!("{:?}", ShareHandle(255)), "ShareHandle(0xff)");
    }

    #[test]
    fn share_handle_native_endian_bytes() {
        let handle = ShareHandle(0x0102_0304_0506_0708);
        assert_eq!(ShareHandle::from_ne_bytes(handle.to_ne_bytes()), handle);
        assert_eq!(handle.to_ne_bytes(), 0x0102_0304_0506_0708u64.to_ne_bytes());
    }
}
