// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Render Hardware Interface (RHI) - API-neutral vocabulary for shared textures.

mod command_queue;
mod device_api;
mod handles;
mod sync;
mod texture;

pub use command_queue::CommandQueue;
pub use device_api::{DeviceApi, SyncModel};
pub use handles::{DeviceHandle, ResourceHandle, ResourceViewHandle, ShareHandle};
pub use sync::SyncMutex;
pub use texture::{GpuResource, ShareMode, TextureDesc, TextureUsages};
