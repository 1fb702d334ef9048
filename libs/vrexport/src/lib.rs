// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! VRExport - publishes one GPU texture of a running renderer to an external
//! viewer process through OS shared GPU handles.
//!
//! The host render loop drives two hooks: "effects reloaded" locates the
//! texture of interest and (re)creates a shareable copy of it, and "frame
//! finished" copies the live frame into that copy. The OS handle of the copy
//! is published through a named shared-memory block that the viewer polls.

#![allow(clippy::missing_safety_doc)] // Safety documented in implementation comments

pub mod core;

#[cfg(unix)]
pub mod posix;

#[cfg(windows)]
pub mod win32;

pub use core::{
    locate_export_texture, Addon, ChannelLayout, CommandQueue, DeviceApi, DeviceHandle,
    DiscoveredTexture, EffectRuntime, EffectVariableHandle, EffectsReloadedHook, ExportConfig,
    ExportError, ExportStatus, Exporter, FrameFinishedHook, GpuResource, HandlePublisher,
    KeyedMutexApi, KeyedMutexBackend, LoggingConfig, PublishedHandle, RenderEvents,
    ResourceHandle, ResourceViewHandle, Result, ShareHandle, ShareMode, SharedResource,
    SharingBackend, SimultaneousAccessApi, SimultaneousAccessBackend, SyncKind, SyncModel,
    SyncMutex, SyncState, TextureBinding, TextureDesc, TextureUsages, TextureVariable,
    ADDON_DESCRIPTION, ADDON_NAME,
};
#[cfg(any(unix, windows))]
pub use core::{SharedMemoryPublisher, SharedMemoryReader};
