// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod backend;
pub mod config;
pub mod error;
pub mod exporter;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod publication;
pub mod rhi;

pub use backend::{
    DiscoveredTexture, KeyedMutexApi, KeyedMutexBackend, SharedResource, SharingBackend,
    SimultaneousAccessApi, SimultaneousAccessBackend, SyncKind, SyncState,
};
pub use config::{ExportConfig, LoggingConfig, TextureVariable};
pub use error::{ExportError, Result};
pub use exporter::{ExportStatus, Exporter};
pub use host::{
    locate_export_texture, EffectRuntime, EffectVariableHandle, EffectsReloadedHook,
    FrameFinishedHook, RenderEvents, TextureBinding, ADDON_DESCRIPTION, ADDON_NAME,
};
pub use lifecycle::Addon;
pub use publication::{ChannelLayout, HandlePublisher, PublishedHandle};
#[cfg(any(unix, windows))]
pub use publication::{SharedMemoryPublisher, SharedMemoryReader};
pub use rhi::{
    CommandQueue, DeviceApi, DeviceHandle, GpuResource, ResourceHandle, ResourceViewHandle,
    ShareHandle, ShareMode, SyncModel, SyncMutex, TextureDesc, TextureUsages,
};
