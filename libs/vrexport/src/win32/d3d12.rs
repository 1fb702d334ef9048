// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Direct3D 12 simultaneous-access sharing.

use std::cell::Cell;

use windows::core::{Interface, HSTRING, PCWSTR};
use windows::Win32::Foundation::{CloseHandle, GENERIC_ALL, HANDLE};
use windows::Win32::Graphics::Direct3D12::{
    ID3D12Device, ID3D12Resource, D3D12_HEAP_FLAG_SHARED, D3D12_HEAP_PROPERTIES,
    D3D12_HEAP_TYPE_DEFAULT, D3D12_RESOURCE_DESC, D3D12_RESOURCE_DIMENSION_TEXTURE2D,
    D3D12_RESOURCE_FLAGS, D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
    D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET, D3D12_RESOURCE_FLAG_ALLOW_SIMULTANEOUS_ACCESS,
    D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS, D3D12_RESOURCE_FLAG_DENY_SHADER_RESOURCE,
    D3D12_RESOURCE_FLAG_NONE, D3D12_RESOURCE_STATE_COMMON, D3D12_TEXTURE_LAYOUT_UNKNOWN,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_SAMPLE_DESC};

use super::describe_error;
use crate::core::backend::SimultaneousAccessApi;
use crate::core::rhi::{
    DeviceHandle, GpuResource, ResourceHandle, ShareHandle, TextureDesc, TextureUsages,
};
use crate::core::{ExportError, Result};

/// Shareable committed resource owned by the add-on.
///
/// Dropping it closes the NT handle exported for it and releases the resource.
pub struct D3D12SharedResource {
    resource: ID3D12Resource,
    nt_handle: Cell<u64>,
}

// SAFETY: ID3D12Resource is free-threaded; the handle cell is only touched
// by the thread that owns the value.
unsafe impl Send for D3D12SharedResource {}

impl GpuResource for D3D12SharedResource {
    fn handle(&self) -> ResourceHandle {
        ResourceHandle::from_ptr(self.resource.as_raw())
    }
}

impl Drop for D3D12SharedResource {
    fn drop(&mut self) {
        let raw = self.nt_handle.replace(0);
        if raw != 0 {
            if let Err(e) = unsafe { CloseHandle(HANDLE(raw as usize as *mut _)) } {
                tracing::warn!("D3D12SharedResource: {}", describe_error("CloseHandle", &e));
            }
        }
    }
}

/// Direct3D 12 device calls.
pub struct D3D12Api {
    shared_handle_name: Option<HSTRING>,
}

impl D3D12Api {
    /// `name` becomes the kernel object name consumers open the resource by.
    pub fn new(name: Option<&str>) -> Self {
        Self {
            shared_handle_name: name.map(HSTRING::from),
        }
    }
}

// SAFETY: HSTRING is an immutable reference-counted string.
unsafe impl Send for D3D12Api {}

impl SimultaneousAccessApi for D3D12Api {
    type Resource = D3D12SharedResource;

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc> {
        let resource = borrow::<ID3D12Resource>(source.as_ptr(), "source resource")?;
        let native = unsafe { resource.GetDesc() };
        Ok(from_native(&native))
    }

    fn create_committed_resource(
        &self,
        device: DeviceHandle,
        desc: &TextureDesc,
    ) -> Result<D3D12SharedResource> {
        let device = borrow::<ID3D12Device>(device.as_ptr(), "device")?;
        let native = to_native(desc);
        let heap = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_DEFAULT,
            ..Default::default()
        };

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            device.CreateCommittedResource(
                &heap,
                D3D12_HEAP_FLAG_SHARED,
                &native,
                D3D12_RESOURCE_STATE_COMMON,
                None,
                &mut resource,
            )
        }
        .map_err(|e| ExportError::Allocation(describe_error("CreateCommittedResource", &e)))?;

        resource
            .map(|resource| D3D12SharedResource {
                resource,
                nt_handle: Cell::new(0),
            })
            .ok_or_else(|| {
                ExportError::Allocation("CreateCommittedResource returned no resource".to_string())
            })
    }

    fn create_shared_handle(
        &self,
        device: DeviceHandle,
        resource: &D3D12SharedResource,
    ) -> Result<ShareHandle> {
        let device = borrow::<ID3D12Device>(device.as_ptr(), "device")?;
        let name = match &self.shared_handle_name {
            Some(name) => PCWSTR(name.as_ptr()),
            None => PCWSTR::null(),
        };

        let handle = unsafe {
            device.CreateSharedHandle(&resource.resource, None, GENERIC_ALL.0, name)
        }
        .map_err(|e| ExportError::HandleExport(describe_error("CreateSharedHandle", &e)))?;

        let raw = handle.0 as usize as u64;
        resource.nt_handle.set(raw);
        Ok(ShareHandle(raw))
    }
}

fn borrow<T: Interface + Clone>(raw: *mut std::ffi::c_void, what: &str) -> Result<T> {
    unsafe { T::from_raw_borrowed(&raw) }
        .cloned()
        .ok_or_else(|| ExportError::CapabilityQuery(format!("host passed a null {}", what)))
}

fn from_native(native: &D3D12_RESOURCE_DESC) -> TextureDesc {
    let flags = native.Flags;
    let mut usage = TextureUsages::empty();
    usage.set(
        TextureUsages::RENDER_TARGET,
        flags.contains(D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET),
    );
    usage.set(
        TextureUsages::UNORDERED_ACCESS,
        flags.contains(D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS),
    );
    usage.set(
        TextureUsages::DEPTH_STENCIL,
        flags.contains(D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL),
    );
    usage.set(
        TextureUsages::SIMULTANEOUS_ACCESS,
        flags.contains(D3D12_RESOURCE_FLAG_ALLOW_SIMULTANEOUS_ACCESS),
    );
    usage.set(
        TextureUsages::SHADER_RESOURCE,
        !flags.contains(D3D12_RESOURCE_FLAG_DENY_SHADER_RESOURCE),
    );

    TextureDesc {
        width: native.Width,
        height: native.Height,
        mip_levels: u32::from(native.MipLevels),
        array_size: u32::from(native.DepthOrArraySize),
        format: native.Format.0 as u32,
        sample_count: native.SampleDesc.Count,
        sample_quality: native.SampleDesc.Quality,
        usage,
        share_mode: Default::default(),
    }
}

fn to_native(desc: &TextureDesc) -> D3D12_RESOURCE_DESC {
    let mut flags: D3D12_RESOURCE_FLAGS = D3D12_RESOURCE_FLAG_NONE;
    for (usage, flag) in [
        (TextureUsages::RENDER_TARGET, D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET),
        (TextureUsages::UNORDERED_ACCESS, D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS),
        (TextureUsages::DEPTH_STENCIL, D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL),
        (TextureUsages::SIMULTANEOUS_ACCESS, D3D12_RESOURCE_FLAG_ALLOW_SIMULTANEOUS_ACCESS),
    ] {
        if desc.usage.contains(usage) {
            flags |= flag;
        }
    }
    // DENY_SHADER_RESOURCE is only valid on depth-stencil resources.
    if desc.usage.contains(TextureUsages::DEPTH_STENCIL)
        && !desc.usage.contains(TextureUsages::SHADER_RESOURCE)
    {
        flags |= D3D12_RESOURCE_FLAG_DENY_SHADER_RESOURCE;
    }

    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
        Alignment: 0,
        Width: desc.width,
        Height: desc.height,
        DepthOrArraySize: desc.array_size as u16,
        MipLevels: desc.mip_levels as u16,
        Format: DXGI_FORMAT(desc.format as i32),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: desc.sample_count,
            Quality: desc.sample_quality,
        },
        Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
        Flags: flags,
    }
}
