// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Direct3D 11 keyed-mutex sharing.

use windows::core::Interface;
use windows::Win32::Foundation::S_OK;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Device, ID3D11Texture2D, D3D11_BIND_DEPTH_STENCIL, D3D11_BIND_RENDER_TARGET,
    D3D11_BIND_SHADER_RESOURCE, D3D11_BIND_UNORDERED_ACCESS, D3D11_CPU_ACCESS_READ,
    D3D11_CPU_ACCESS_WRITE, D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX, D3D11_TEXTURE2D_DESC,
    D3D11_USAGE_DEFAULT,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::{IDXGIKeyedMutex, IDXGIResource};

use super::describe_error;
use crate::core::backend::KeyedMutexApi;
use crate::core::rhi::{
    DeviceHandle, GpuResource, ResourceHandle, ShareHandle, ShareMode, SyncMutex, TextureDesc,
    TextureUsages,
};
use crate::core::{ExportError, Result};

const INFINITE: u32 = u32::MAX;

/// Shareable `ID3D11Texture2D` owned by the add-on. Released on drop.
pub struct D3D11Texture(ID3D11Texture2D);

// SAFETY: D3D11 resources are free-threaded; the add-on only touches them
// from the host's render thread.
unsafe impl Send for D3D11Texture {}

impl GpuResource for D3D11Texture {
    fn handle(&self) -> ResourceHandle {
        ResourceHandle::from_ptr(self.0.as_raw())
    }
}

/// `IDXGIKeyedMutex` of a shared texture.
pub struct D3D11KeyedMutex(IDXGIKeyedMutex);

// SAFETY: DXGI keyed mutexes may be acquired and released from any thread.
unsafe impl Send for D3D11KeyedMutex {}

impl SyncMutex for D3D11KeyedMutex {
    fn acquire_sync(&self, key: u64) -> Result<()> {
        // WAIT_ABANDONED and WAIT_TIMEOUT are success HRESULTs; only S_OK means the key is held.
        let hr = unsafe {
            (Interface::vtable(&self.0).AcquireSync)(Interface::as_raw(&self.0), key, INFINITE)
        };
        if hr == S_OK {
            return Ok(());
        }
        let message = if hr.is_ok() {
            format!("AcquireSync: returned {:#010x} without the key", hr.0)
        } else {
            describe_error("AcquireSync", &windows::core::Error::from(hr))
        };
        Err(ExportError::Sync(message))
    }

    fn release_sync(&self, key: u64) -> Result<()> {
        unsafe { self.0.ReleaseSync(key) }
            .map_err(|e| ExportError::Sync(describe_error("ReleaseSync", &e)))
    }
}

/// Direct3D 11 device calls.
pub struct D3D11Api;

impl KeyedMutexApi for D3D11Api {
    type Texture = D3D11Texture;
    type Mutex = D3D11KeyedMutex;

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc> {
        let texture = borrow::<ID3D11Texture2D>(source.as_ptr(), "source texture")?;
        let mut native = D3D11_TEXTURE2D_DESC::default();
        unsafe { texture.GetDesc(&mut native) };
        Ok(from_native(&native))
    }

    fn create_texture(&self, device: DeviceHandle, desc: &TextureDesc) -> Result<D3D11Texture> {
        let device = borrow::<ID3D11Device>(device.as_ptr(), "device")?;
        let native = to_native(desc);

        let mut texture: Option<ID3D11Texture2D> = None;
        unsafe { device.CreateTexture2D(&native, None, Some(&mut texture)) }
            .map_err(|e| ExportError::Allocation(describe_error("CreateTexture2D", &e)))?;

        texture.map(D3D11Texture).ok_or_else(|| {
            ExportError::Allocation("CreateTexture2D returned no texture".to_string())
        })
    }

    fn keyed_mutex(&self, texture: &D3D11Texture) -> Result<D3D11KeyedMutex> {
        texture
            .0
            .cast::<IDXGIKeyedMutex>()
            .map(D3D11KeyedMutex)
            .map_err(|e| ExportError::CapabilityQuery(describe_error("IDXGIKeyedMutex", &e)))
    }

    fn shared_handle(&self, texture: &D3D11Texture) -> Result<ShareHandle> {
        let resource = texture
            .0
            .cast::<IDXGIResource>()
            .map_err(|e| ExportError::CapabilityQuery(describe_error("IDXGIResource", &e)))?;

        let handle = unsafe { resource.GetSharedHandle() }
            .map_err(|e| ExportError::HandleExport(describe_error("GetSharedHandle", &e)))?;
        Ok(ShareHandle(handle.0 as usize as u64))
    }
}

/// AddRef a host-owned COM pointer.
fn borrow<T: Interface + Clone>(raw: *mut std::ffi::c_void, what: &str) -> Result<T> {
    unsafe { T::from_raw_borrowed(&raw) }
        .cloned()
        .ok_or_else(|| ExportError::CapabilityQuery(format!("host passed a null {}", what)))
}

fn from_native(native: &D3D11_TEXTURE2D_DESC) -> TextureDesc {
    let bind = native.BindFlags;
    let cpu = native.CPUAccessFlags;

    let mut usage = TextureUsages::empty();
    let flag = |bits: i32| bind & bits as u32 != 0;
    usage.set(TextureUsages::RENDER_TARGET, flag(D3D11_BIND_RENDER_TARGET.0));
    usage.set(TextureUsages::SHADER_RESOURCE, flag(D3D11_BIND_SHADER_RESOURCE.0));
    usage.set(TextureUsages::UNORDERED_ACCESS, flag(D3D11_BIND_UNORDERED_ACCESS.0));
    usage.set(TextureUsages::DEPTH_STENCIL, flag(D3D11_BIND_DEPTH_STENCIL.0));
    usage.set(TextureUsages::CPU_READ, cpu & D3D11_CPU_ACCESS_READ.0 as u32 != 0);
    usage.set(TextureUsages::CPU_WRITE, cpu & D3D11_CPU_ACCESS_WRITE.0 as u32 != 0);

    let share_mode = if native.MiscFlags & D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX.0 as u32 != 0 {
        ShareMode::KeyedMutex
    } else {
        ShareMode::None
    };

    TextureDesc {
        width: u64::from(native.Width),
        height: native.Height,
        mip_levels: native.MipLevels,
        array_size: native.ArraySize,
        format: native.Format.0 as u32,
        sample_count: native.SampleDesc.Count,
        sample_quality: native.SampleDesc.Quality,
        usage,
        share_mode,
    }
}

fn to_native(desc: &TextureDesc) -> D3D11_TEXTURE2D_DESC {
    let mut bind = 0u32;
    for (usage, bits) in [
        (TextureUsages::RENDER_TARGET, D3D11_BIND_RENDER_TARGET.0),
        (TextureUsages::SHADER_RESOURCE, D3D11_BIND_SHADER_RESOURCE.0),
        (TextureUsages::UNORDERED_ACCESS, D3D11_BIND_UNORDERED_ACCESS.0),
        (TextureUsages::DEPTH_STENCIL, D3D11_BIND_DEPTH_STENCIL.0),
    ] {
        if desc.usage.contains(usage) {
            bind |= bits as u32;
        }
    }

    let mut cpu = 0u32;
    if desc.usage.contains(TextureUsages::CPU_READ) {
        cpu |= D3D11_CPU_ACCESS_READ.0 as u32;
    }
    if desc.usage.contains(TextureUsages::CPU_WRITE) {
        cpu |= D3D11_CPU_ACCESS_WRITE.0 as u32;
    }

    // Misc flags are replaced, not merged.
    let misc = match desc.share_mode {
        ShareMode::KeyedMutex => D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX.0 as u32,
        ShareMode::None => 0,
    };

    D3D11_TEXTURE2D_DESC {
        Width: desc.width as u32,
        Height: desc.height,
        MipLevels: desc.mip_levels,
        ArraySize: desc.array_size,
        Format: DXGI_FORMAT(desc.format as i32),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: desc.sample_count,
            Quality: desc.sample_quality,
        },
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: bind,
        CPUAccessFlags: cpu,
        MiscFlags: misc,
    }
}
