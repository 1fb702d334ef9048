// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Keyed-mutex sharing (Direct3D 11 model).

use super::{DiscoveredTexture, SharedResource, SharingBackend, SyncState};
use crate::core::rhi::{
    DeviceApi, DeviceHandle, GpuResource, ResourceHandle, ShareHandle, SyncModel, SyncMutex,
    TextureDesc,
};
use crate::core::Result;

/// Device calls the keyed-mutex backend is built from.
///
/// On Windows this is `ID3D11Device::CreateTexture2D` plus the
/// `IDXGIKeyedMutex` / `IDXGIResource` queries on the new texture.
pub trait KeyedMutexApi: Send {
    type Texture: GpuResource + 'static;
    type Mutex: SyncMutex + 'static;

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc>;

    fn create_texture(&self, device: DeviceHandle, desc: &TextureDesc) -> Result<Self::Texture>;

    fn keyed_mutex(&self, texture: &Self::Texture) -> Result<Self::Mutex>;

    fn shared_handle(&self, texture: &Self::Texture) -> Result<ShareHandle>;
}

/// Shares textures as keyed-mutex resources.
pub struct KeyedMutexBackend<A> {
    api: A,
}

impl<A: KeyedMutexApi> KeyedMutexBackend<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: KeyedMutexApi> SharingBackend for KeyedMutexBackend<A> {
    fn api(&self) -> DeviceApi {
        DeviceApi::D3D11
    }

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc> {
        self.api.describe(source)
    }

    fn create_shared(&self, source: &DiscoveredTexture) -> Result<SharedResource> {
        let desc = self
            .api
            .describe(source.texture)?
            .make_shareable(SyncModel::KeyedMutex);

        let texture = self.api.create_texture(source.device, &desc)?;
        tracing::debug!("KeyedMutexBackend: allocated shareable texture {}", desc);

        let sync = match self.api.keyed_mutex(&texture) {
            Ok(mutex) => SyncState::Keyed(Box::new(mutex)),
            Err(e) => {
                tracing::warn!(
                    "KeyedMutexBackend: {}; frames will be copied without synchronization",
                    e
                );
                SyncState::Unavailable
            }
        };

        // On failure `texture` drops here, releasing the allocation.
        let share_handle = self.api.shared_handle(&texture)?;
        tracing::info!("KeyedMutexBackend: got shared handle {}", share_handle);

        Ok(SharedResource::new(
            DeviceApi::D3D11,
            Box::new(texture),
            share_handle,
            desc,
            sync,
        ))
    }
}
