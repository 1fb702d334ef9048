// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Simultaneous-access sharing (Direct3D 12 model).
//!
//! No lock is created. The consumer relies on the simultaneous-access flag
//! and its own discipline; producer writes and consumer reads may overlap.

use super::{DiscoveredTexture, SharedResource, SharingBackend, SyncState};
use crate::core::rhi::{
    DeviceApi, DeviceHandle, GpuResource, ResourceHandle, ShareHandle, SyncModel, TextureDesc,
};
use crate::core::Result;

/// Device calls the simultaneous-access backend is built from.
///
/// On Windows this is `ID3D12Device::CreateCommittedResource` (default heap,
/// shared heap flag, common initial state) and `ID3D12Device::CreateSharedHandle`.
pub trait SimultaneousAccessApi: Send {
    type Resource: GpuResource + 'static;

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc>;

    fn create_committed_resource(
        &self,
        device: DeviceHandle,
        desc: &TextureDesc,
    ) -> Result<Self::Resource>;

    /// Export a handle for `resource` directly from the device.
    fn create_shared_handle(
        &self,
        device: DeviceHandle,
        resource: &Self::Resource,
    ) -> Result<ShareHandle>;
}

/// Shares textures as simultaneous-access committed resources.
pub struct SimultaneousAccessBackend<A> {
    api: A,
}

impl<A: SimultaneousAccessApi> SimultaneousAccessBackend<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: SimultaneousAccessApi> SharingBackend for SimultaneousAccessBackend<A> {
    fn api(&self) -> DeviceApi {
        DeviceApi::D3D12
    }

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc> {
        self.api.describe(source)
    }

    fn create_shared(&self, source: &DiscoveredTexture) -> Result<SharedResource> {
        let desc = self
            .api
            .describe(source.texture)?
            .make_shareable(SyncModel::SimultaneousAccess);

        let resource = self.api.create_committed_resource(source.device, &desc)?;
        tracing::debug!(
            "SimultaneousAccessBackend: allocated committed resource {}",
            desc
        );

        let share_handle = self.api.create_shared_handle(source.device, &resource)?;
        tracing::info!(
            "SimultaneousAccessBackend: got shared handle {}",
            share_handle
        );

        Ok(SharedResource::new(
            DeviceApi::D3D12,
            Box::new(resource),
            share_handle,
            desc,
            SyncState::SimultaneousAccess,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::core::backend::SyncKind;
    use crate::core::rhi::TextureUsages;
    use crate::core::ExportError;

    struct FakeResource {
        released: Arc<AtomicUsize>,
    }

    impl GpuResource for FakeResource {
        fn handle(&self) -> ResourceHandle {
            ResourceHandle(0xB000)
        }
    }

    impl Drop for FakeResource {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeD3D12 {
        fail_alloc: bool,
        fail_handle: bool,
        released: Arc<AtomicUsize>,
        last_usage: parking_lot::Mutex<Option<TextureUsages>>,
    }

    impl SimultaneousAccessApi for FakeD3D12 {
        type Resource = FakeResource;

        fn describe(&self, _source: ResourceHandle) -> Result<TextureDesc> {
            Ok(TextureDesc::new(2560, 1440, 10))
        }

        fn create_committed_resource(
            &self,
            _device: DeviceHandle,
            desc: &TextureDesc,
        ) -> Result<FakeResource> {
            if self.fail_alloc {
                return Err(ExportError::Allocation("E_OUTOFMEMORY".into()));
            }
            *self.last_usage.lock() = Some(desc.usage);
            Ok(FakeResource {
                released: Arc::clone(&self.released),
            })
        }

        fn create_shared_handle(
            &self,
            _device: DeviceHandle,
            _resource: &FakeResource,
        ) -> Result<ShareHandle> {
            if self.fail_handle {
                return Err(ExportError::HandleExport("E_ACCESSDENIED".into()));
            }
            Ok(ShareHandle(0x9f0))
        }
    }

    fn discovered() -> DiscoveredTexture {
        DiscoveredTexture {
            api: DeviceApi::D3D12,
            device: DeviceHandle(0x30),
            texture: ResourceHandle(0x40),
        }
    }

    #[test]
    fn creates_simultaneous_access_resource_without_mutex() {
        let backend = SimultaneousAccessBackend::new(FakeD3D12::default());

        let shared = backend.create_shared(&discovered()).unwrap();

        assert_eq!(shared.api(), DeviceApi::D3D12);
        assert_eq!(shared.share_handle(), ShareHandle(0x9f0));
        assert_eq!(shared.sync().kind(), SyncKind::SimultaneousAccess);
        let usage = (*backend.api.last_usage.lock()).unwrap();
        assert!(usage.contains(TextureUsages::SIMULTANEOUS_ACCESS | TextureUsages::RENDER_TARGET));
    }

    #[test]
    fn allocation_failure_is_reported() {
        let backend = SimultaneousAccessBackend::new(FakeD3D12 {
            fail_alloc: true,
            ..Default::default()
        });

        let result = backend.create_shared(&discovered());

        assert!(matches!(result, Err(ExportError::Allocation(_))));
        assert_eq!(backend.api.released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handle_failure_releases_resource() {
        let backend = SimultaneousAccessBackend::new(FakeD3D12 {
            fail_handle: true,
            ..Default::default()
        });

        assert!(backend.create_shared(&discovered()).is_err());
        assert_eq!(backend.api.released.load(Ordering::SeqCst), 1);
    }
}
