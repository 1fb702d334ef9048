// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! RHI texture description.

use bitflags::bitflags;

use super::device_api::SyncModel;
use super::handles::ResourceHandle;

bitflags! {
    /// Capabilities a texture is created with.
    ///
    /// Backends map these to `D3D11_BIND_*` / `D3D11_CPU_ACCESS_*` or
    /// `D3D12_RESOURCE_FLAG_*` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureUsages: u32 {
        const RENDER_TARGET = 1 << 0;
        const SHADER_RESOURCE = 1 << 1;
        const UNORDERED_ACCESS = 1 << 2;
        const DEPTH_STENCIL = 1 << 3;
        /// Concurrent access from several queues/processes without a lock.
        const SIMULTANEOUS_ACCESS = 1 << 4;
        const CPU_READ = 1 << 5;
        const CPU_WRITE = 1 << 6;
    }
}

/// Cross-process sharing mode recorded in the texture's misc flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShareMode {
    #[default]
    None,
    /// Shared with a DXGI keyed mutex attached.
    KeyedMutex,
}

/// API-neutral description of a 2D texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u64,
    pub height: u32,
    pub mip_levels: u32,
    pub array_size: u32,
    /// Raw `DXGI_FORMAT` value; copied through untouched.
    pub format: u32,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub usage: TextureUsages,
    pub share_mode: ShareMode,
}

impl TextureDesc {
    /// Single-mip, single-sample 2D texture.
    pub fn new(width: u64, height: u32, format: u32) -> Self {
        Self {
            width,
            height,
            mip_levels: 1,
            array_size: 1,
            format,
            sample_count: 1,
            sample_quality: 0,
            usage: TextureUsages::SHADER_RESOURCE,
            share_mode: ShareMode::None,
        }
    }

    pub fn with_usage(mut self, usage: TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    /// Copy of this description with the capabilities needed to share it.
    pub fn make_shareable(&self, model: SyncModel) -> Self {
        let mut desc = self.clone();
        match model {
            SyncModel::KeyedMutex => {
                desc.usage |= TextureUsages::RENDER_TARGET | TextureUsages::SHADER_RESOURCE;
                desc.usage.remove(TextureUsages::CPU_READ | TextureUsages::CPU_WRITE);
                desc.share_mode = ShareMode::KeyedMutex;
            }
            SyncModel::SimultaneousAccess => {
                desc.usage |= TextureUsages::SIMULTANEOUS_ACCESS | TextureUsages::RENDER_TARGET;
            }
        }
        desc
    }

    /// Whether a full-resource copy between the two is valid.
    ///
    /// Capability flags may differ; extent, layout and format may not.
    pub fn is_copy_compatible(&self, other: &TextureDesc) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.mip_levels == other.mip_levels
            && self.array_size == other.array_size
            && self.format == other.format
            && self.sample_count == other.sample_count
    }
}

impl std::fmt::Display for TextureDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} fmt={} mips={} layers={}",
            self.width, self.height, self.format, self.mip_levels, self.array_size
        )
    }
}

/// A GPU resource owned by this add-on.
///
/// Dropping the value releases the resource and any OS handle it owns.
pub trait GpuResource: Send {
    fn handle(&self) -> ResourceHandle;
}
