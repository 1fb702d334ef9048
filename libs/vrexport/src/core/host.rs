// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The host renderer boundary.
//!
//! The host owns the devices, the effect runtime and the render loop. It
//! reaches the add-on only through the two hooks registered on
//! [`RenderEvents`], always from its render thread.

use crate::core::backend::DiscoveredTexture;
use crate::core::config::TextureVariable;
use crate::core::rhi::{CommandQueue, DeviceApi, DeviceHandle, ResourceHandle, ResourceViewHandle};

pub const ADDON_NAME: &str = "VRExport";
pub const ADDON_DESCRIPTION: &str = "Export 3D back buffers to KatangaVR and Artum's VR Viewer.";

/// Opaque handle of a texture variable inside a loaded effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectVariableHandle(pub u64);

/// Views the effect runtime binds for a texture variable. Either may be null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureBinding {
    pub view: ResourceViewHandle,
    pub srgb_view: ResourceViewHandle,
}

impl TextureBinding {
    /// The sRGB view when bound, otherwise the plain view.
    pub fn preferred_view(&self) -> Option<ResourceViewHandle> {
        if !self.srgb_view.is_null() {
            Some(self.srgb_view)
        } else if !self.view.is_null() {
            Some(self.view)
        } else {
            None
        }
    }
}

/// The host's post-processing runtime, as seen from the "effects reloaded" hook.
pub trait EffectRuntime {
    /// `None` for APIs the add-on does not know.
    fn device_api(&self) -> Option<DeviceApi>;

    fn native_device(&self) -> DeviceHandle;

    fn find_texture_variable(&self, effect: &str, variable: &str) -> Option<EffectVariableHandle>;

    fn texture_binding(&self, variable: EffectVariableHandle) -> TextureBinding;

    fn resource_from_view(&self, view: ResourceViewHandle) -> ResourceHandle;
}

pub type EffectsReloadedHook = Box<dyn FnMut(&dyn EffectRuntime) + Send>;
pub type FrameFinishedHook = Box<dyn FnMut(&mut dyn CommandQueue) + Send>;

/// Hook registration offered by the host.
pub trait RenderEvents {
    fn register_effects_reloaded(&mut self, hook: EffectsReloadedHook);

    fn register_frame_finished(&mut self, hook: FrameFinishedHook);

    /// Drop every hook this add-on registered.
    fn unregister_all(&mut self);
}

/// Find the texture to export.
///
/// Candidates are tried in order and the first variable the runtime knows is
/// used, even if it has no view bound; later candidates are not consulted.
pub fn locate_export_texture(
    runtime: &dyn EffectRuntime,
    candidates: &[TextureVariable],
) -> Option<DiscoveredTexture> {
    let (candidate, variable) = candidates.iter().find_map(|candidate| {
        runtime
            .find_texture_variable(&candidate.effect, &candidate.variable)
            .map(|variable| (candidate, variable))
    })?;

    let Some(view) = runtime.texture_binding(variable).preferred_view() else {
        tracing::debug!("Host: {} has no view bound", candidate);
        return None;
    };

    let Some(api) = runtime.device_api() else {
        tracing::warn!("Host: found {} on an unsupported device API", candidate);
        return None;
    };

    let texture = runtime.resource_from_view(view);
    if texture.is_null() {
        tracing::debug!("Host: view of {} has no backing resource", candidate);
        return None;
    }

    tracing::debug!("Host: found {} on {}", candidate, api);
    Some(DiscoveredTexture {
        api,
        device: runtime.native_device(),
        texture,
    })
}
