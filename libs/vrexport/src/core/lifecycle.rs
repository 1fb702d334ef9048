// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Add-on attach/detach.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::config::{ExportConfig, TextureVariable};
use crate::core::exporter::Exporter;
use crate::core::host::{locate_export_texture, RenderEvents, ADDON_NAME};
use crate::core::logging;

/// A registered add-on instance.
///
/// Both hooks share one [`Exporter`]. The host calls them from its render
/// thread, so the lock is never contended there.
pub struct Addon {
    exporter: Arc<Mutex<Exporter>>,
}

impl Addon {
    /// Configure from `vrexport.toml` in `addon_dir`, start logging, and attach.
    ///
    /// A broken config file is logged and replaced by defaults rather than
    /// keeping the add-on from loading.
    #[cfg(any(unix, windows))]
    pub fn load(events: &mut dyn RenderEvents, addon_dir: &Path) -> Self {
        let (config, config_error) = match ExportConfig::load_from_dir(addon_dir) {
            Ok(config) => (config, None),
            Err(e) => (ExportConfig::default(), Some(e)),
        };

        if let Err(e) = logging::init(&config.logging) {
            // Only reachable when the log directory cannot be created.
            let _ = logging::init(&Default::default());
            tracing::warn!("Addon: file logging unavailable: {}", e);
        }
        if let Some(e) = config_error {
            tracing::error!("Addon: {}; using defaults", e);
        }

        Self::attach(events, &config)
    }

    #[cfg(any(unix, windows))]
    pub fn attach(events: &mut dyn RenderEvents, config: &ExportConfig) -> Self {
        Self::attach_with(
            events,
            Exporter::from_config(config),
            config.texture_candidates.clone(),
        )
    }

    /// Register both hooks around a caller-built exporter.
    pub fn attach_with(
        events: &mut dyn RenderEvents,
        exporter: Exporter,
        candidates: Vec<TextureVariable>,
    ) -> Self {
        let exporter = Arc::new(Mutex::new(exporter));

        let on_reload = Arc::clone(&exporter);
        events.register_effects_reloaded(Box::new(move |runtime| {
            tracing::debug!("Addon: effects reloaded, searching export texture");
            if let Some(texture) = locate_export_texture(runtime, &candidates) {
                on_reload.lock().on_texture_discovered(texture);
            }
        }));

        let on_frame = Arc::clone(&exporter);
        events.register_frame_finished(Box::new(move |queue| {
            on_frame.lock().on_frame_finished(queue);
        }));

        tracing::info!("Addon: {} attached", ADDON_NAME);
        Self { exporter }
    }

    pub fn exporter(&self) -> &Arc<Mutex<Exporter>> {
        &self.exporter
    }

    /// Unregister both hooks, then release the shared resource.
    pub fn detach(self, events: &mut dyn RenderEvents) {
        events.unregister_all();
        self.exporter.lock().release();
        tracing::info!("Addon: {} detached", ADDON_NAME);
    }
}

impl std::fmt::Debug for Addon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Addon")
            .field("status", &self.exporter.lock().status())
            .finish()
    }
}
