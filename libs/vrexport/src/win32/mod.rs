// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Windows platform support: Direct3D sharing backends and the
//! `CreateFileMappingW` publication channel.

pub mod d3d11;
pub mod d3d12;
pub mod shared_memory;

use crate::core::backend::{KeyedMutexBackend, SharingBackend, SimultaneousAccessBackend};
use crate::core::ExportConfig;

/// The sharing backends for every API this platform supports.
pub fn platform_backends(config: &ExportConfig) -> Vec<Box<dyn SharingBackend>> {
    vec![
        Box::new(KeyedMutexBackend::new(d3d11::D3D11Api)),
        Box::new(SimultaneousAccessBackend::new(d3d12::D3D12Api::new(
            config.d3d12_shared_handle_name.as_deref(),
        ))),
    ]
}

/// `"<message> (0x887a0005)"` for log lines.
pub(crate) fn describe_error(call: &str, error: &windows::core::Error) -> String {
    format!("{}: {} ({:#010x})", call, error.message(), error.code().0)
}
