// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

use crate::core::rhi::DeviceApi;

#[derive(Error, Debug)]
pub enum ExportError {
    /// The device refused to create the shareable resource.
    #[error("Shared resource allocation failed: {0}")]
    Allocation(String),

    /// A capability interface (keyed mutex, DXGI resource) could not be obtained.
    #[error("Capability query failed: {0}")]
    CapabilityQuery(String),

    #[error("Shared handle export failed: {0}")]
    HandleExport(String),

    #[error("Shared memory {operation} failed (os error {code})")]
    SharedMemory { operation: &'static str, code: i64 },

    #[error("Keyed mutex operation failed: {0}")]
    Sync(String),

    #[error("Texture description mismatch: {0}")]
    DescriptorMismatch(String),

    #[error("No sharing backend registered for {0}")]
    UnsupportedApi(DeviceApi),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Builds a shared-memory error from the calling thread's last OS error.
    pub fn last_os_error(operation: &'static str) -> Self {
        let code = std::io::Error::last_os_error()
            .raw_os_error()
            .map(i64::from)
            .unwrap_or(-1);
        Self::SharedMemory { operation, code }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_memory_error_reports_operation_and_code() {
        let err = ExportError::SharedMemory {
            operation: "mapping creation",
            code: 5,
        };
        assert_eq!(
            err.to_string(),
            "Shared memory mapping creation failed (os error 5)"
        );
    }

    #[test]
    fn unsupported_api_names_the_api() {
        let err = ExportError::UnsupportedApi(DeviceApi::D3D12);
        assert_eq!(err.to_string(), "No sharing backend registered for d3d12");
    }
}
