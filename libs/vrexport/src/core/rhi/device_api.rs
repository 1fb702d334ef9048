// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Graphics API reported by the host device.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Graphics API the host renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceApi {
    /// Direct3D 11: sharing guarded by a DXGI keyed mutex.
    D3D11,
    /// Direct3D 12: sharing through a simultaneous-access resource.
    D3D12,
}

/// How producer and consumer serialize access to a shared resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncModel {
    /// Explicit cross-process lock bound to the resource.
    KeyedMutex,
    /// Resource flag permitting concurrent access from several contexts; no lock.
    SimultaneousAccess,
}

impl DeviceApi {
    pub const ALL: [DeviceApi; 2] = [DeviceApi::D3D11, DeviceApi::D3D12];

    /// Synchronization model this API uses for cross-process sharing.
    pub fn sync_model(&self) -> SyncModel {
        match self {
            Self::D3D11 => SyncModel::KeyedMutex,
            Self::D3D12 => SyncModel::SimultaneousAccess,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::D3D11 => "d3d11",
            Self::D3D12 => "d3d12",
        }
    }
}

impl FromStr for DeviceApi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "d3d11" | "dx11" => Ok(Self::D3D11),
            "d3d12" | "dx12" => Ok(Self::D3D12),
            _ => Err(format!(
                "Unknown device API '{}'. Valid values: d3d11, d3d12",
                s
            )),
        }
    }
}

impl std::fmt::Display for DeviceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
