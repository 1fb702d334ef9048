// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Resource sharing backends, one per graphics API.
//!
//! Each backend turns a host texture into a shareable copy with an OS-level
//! handle. The two APIs model cross-process access differently, so the
//! resulting [`SharedResource`] carries a [`SyncState`] the frame copier
//! branches on.

mod keyed_mutex;
mod simultaneous_access;

pub use keyed_mutex::{KeyedMutexApi, KeyedMutexBackend};
pub use simultaneous_access::{SimultaneousAccessApi, SimultaneousAccessBackend};

use crate::core::rhi::{
    DeviceApi, DeviceHandle, GpuResource, ResourceHandle, ShareHandle, SyncMutex, TextureDesc,
};
use crate::core::Result;

/// A texture of interest reported by the host, with the device that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredTexture {
    pub api: DeviceApi,
    pub device: DeviceHandle,
    pub texture: ResourceHandle,
}

/// Synchronization available for the current shared resource.
pub enum SyncState {
    /// Keyed mutex obtained; every copy is bracketed by acquire/release.
    Keyed(Box<dyn SyncMutex>),
    /// Keyed-mutex sharing was requested but the mutex query failed.
    /// Copies run unsynchronized.
    Unavailable,
    /// Resource was created for simultaneous access; no lock exists.
    SimultaneousAccess,
}

/// Copyable summary of a [`SyncState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    KeyedMutex,
    Unavailable,
    SimultaneousAccess,
}

impl SyncState {
    pub fn kind(&self) -> SyncKind {
        match self {
            Self::Keyed(_) => SyncKind::KeyedMutex,
            Self::Unavailable => SyncKind::Unavailable,
            Self::SimultaneousAccess => SyncKind::SimultaneousAccess,
        }
    }
}

impl std::fmt::Debug for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind())
    }
}

/// The shareable copy of the source texture, exclusively owned by the add-on.
///
/// Dropping it releases the GPU resource; the published handle goes stale.
pub struct SharedResource {
    api: DeviceApi,
    resource: Box<dyn GpuResource>,
    share_handle: ShareHandle,
    desc: TextureDesc,
    sync: SyncState,
}

impl SharedResource {
    pub fn new(
        api: DeviceApi,
        resource: Box<dyn GpuResource>,
        share_handle: ShareHandle,
        desc: TextureDesc,
        sync: SyncState,
    ) -> Self {
        Self {
            api,
            resource,
            share_handle,
            desc,
            sync,
        }
    }

    pub fn api(&self) -> DeviceApi {
        self.api
    }

    pub fn resource(&self) -> ResourceHandle {
        self.resource.handle()
    }

    pub fn share_handle(&self) -> ShareHandle {
        self.share_handle
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn sync(&self) -> &SyncState {
        &self.sync
    }
}

impl std::fmt::Debug for SharedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedResource")
            .field("api", &self.api)
            .field("resource", &self.resource.handle())
            .field("share_handle", &self.share_handle)
            .field("desc", &self.desc)
            .field("sync", &self.sync)
            .finish()
    }
}

/// One graphics API's way of sharing a texture across processes.
pub trait SharingBackend: Send {
    fn api(&self) -> DeviceApi;

    /// Current description of a host texture.
    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc>;

    /// Allocate a shareable copy of `source` and export its OS handle.
    ///
    /// Callers must drop any previous [`SharedResource`] first.
    fn create_shared(&self, source: &DiscoveredTexture) -> Result<SharedResource>;
}
