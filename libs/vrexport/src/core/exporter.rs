// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Exporter - owns the current source/shared pair and drives both host hooks.
//!
//! There is exactly one `Exporter` per add-on instance. The host calls it
//! from its render thread only; it never creates threads of its own. No
//! method returns an error: failures are logged and the call returns early,
//! leaving the previous state (or nothing) in place until the host reports
//! the texture again.

use crate::core::backend::{DiscoveredTexture, SharedResource, SharingBackend, SyncKind, SyncState};
use crate::core::publication::HandlePublisher;
use crate::core::rhi::{CommandQueue, DeviceApi, ResourceHandle, ShareHandle};
use crate::core::ExportError;

/// Snapshot of the exporter for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportStatus {
    pub source: Option<ResourceHandle>,
    pub api: Option<DeviceApi>,
    pub share_handle: Option<ShareHandle>,
    pub sync: Option<SyncKind>,
    /// Number of successful publications so far.
    pub generation: u64,
    pub resources_created: u64,
    pub frames_copied: u64,
    pub frames_skipped: u64,
}

pub struct Exporter {
    backends: Vec<Box<dyn SharingBackend>>,
    publisher: Box<dyn HandlePublisher>,
    mutex_key: u64,

    source: Option<DiscoveredTexture>,
    shared: Option<SharedResource>,
    generation: u64,

    resources_created: u64,
    frames_copied: u64,
    frames_skipped: u64,
    warned_unsynchronized: bool,
    warned_mismatch: bool,
    warned_describe_failure: bool,
}

impl Exporter {
    /// Exporter with no backends; add them with [`Exporter::with_backend`].
    pub fn new(publisher: Box<dyn HandlePublisher>) -> Self {
        Self {
            backends: Vec::new(),
            publisher,
            mutex_key: 0,
            source: None,
            shared: None,
            generation: 0,
            resources_created: 0,
            frames_copied: 0,
            frames_skipped: 0,
            warned_unsynchronized: false,
            warned_mismatch: false,
            warned_describe_failure: false,
        }
    }

    /// Exporter publishing through the configured shared-memory channel,
    /// with every backend the platform provides.
    #[cfg(any(unix, windows))]
    pub fn from_config(config: &crate::core::ExportConfig) -> Self {
        let publisher = crate::core::publication::SharedMemoryPublisher::new(
            config.channel_name.clone(),
            config.channel_layout,
        );

        #[allow(unused_mut)]
        let mut exporter = Self::new(Box::new(publisher))
            .with_mutex_key(config.mutex_key);

        #[cfg(windows)]
        for backend in crate::win32::platform_backends(config) {
            exporter = exporter.with_backend(backend);
        }

        exporter
    }

    /// Register `backend`, replacing any backend for the same API.
    pub fn with_backend(mut self, backend: Box<dyn SharingBackend>) -> Self {
        self.backends.retain(|existing| existing.api() != backend.api());
        self.backends.push(backend);
        self
    }

    /// Key acquired and released on the keyed mutex around every copy.
    pub fn with_mutex_key(mut self, key: u64) -> Self {
        self.mutex_key = key;
        self
    }

    pub fn supports(&self, api: DeviceApi) -> bool {
        self.backends.iter().any(|backend| backend.api() == api)
    }

    pub fn shared_resource(&self) -> Option<&SharedResource> {
        self.shared.as_ref()
    }

    /// The host found (or re-found) the texture of interest.
    ///
    /// Any previous shared resource is released before a new one is created,
    /// so at most one exists at a time.
    pub fn on_texture_discovered(&mut self, texture: DiscoveredTexture) {
        self.source = Some(texture);
        self.warned_mismatch = false;
        self.warned_describe_failure = false;

        if let Some(previous) = self.shared.take() {
            tracing::debug!(
                "Exporter: releasing shared resource {}",
                previous.share_handle()
            );
            drop(previous);
        }

        let Some(backend) = self
            .backends
            .iter()
            .find(|backend| backend.api() == texture.api)
        else {
            tracing::warn!(
                "Exporter: {}, not exporting",
                ExportError::UnsupportedApi(texture.api)
            );
            return;
        };

        let shared = match backend.create_shared(&texture) {
            Ok(shared) => shared,
            Err(e) => {
                tracing::error!("Exporter: could not create shared texture: {}", e);
                return;
            }
        };
        self.resources_created += 1;
        self.warned_unsynchronized = false;

        let share_handle = shared.share_handle();
        let generation = self.generation + 1;
        if let Err(e) = self.publisher.publish(share_handle, generation) {
            tracing::error!(
                "Exporter: could not publish shared handle {}: {}",
                share_handle,
                e
            );
            return;
        }
        self.generation = generation;

        tracing::info!(
            "Exporter: sharing {} texture {} as {} (generation {})",
            shared.api(),
            shared.desc(),
            share_handle,
            generation
        );
        self.shared = Some(shared);
    }

    /// The host finished a frame: copy the source into the shared resource.
    pub fn on_frame_finished(&mut self, queue: &mut dyn CommandQueue) {
        let (Some(source), Some(shared)) = (&self.source, &self.shared) else {
            return;
        };

        if let Some(backend) = self.backends.iter().find(|b| b.api() == shared.api()) {
            match backend.describe(source.texture) {
                Ok(current) if !current.is_copy_compatible(shared.desc()) => {
                    if !self.warned_mismatch {
                        let mismatch = ExportError::DescriptorMismatch(format!(
                            "source is now {}, shared texture is {}",
                            current,
                            shared.desc()
                        ));
                        tracing::warn!(
                            "Exporter: {}; skipping copies until the texture is reported again",
                            mismatch
                        );
                        self.warned_mismatch = true;
                    }
                    self.frames_skipped += 1;
                    return;
                }
                Ok(_) => self.warned_describe_failure = false,
                Err(e) => {
                    if !self.warned_describe_failure {
                        tracing::error!(
                            "Exporter: could not describe source texture: {}; skipping copies",
                            e
                        );
                        self.warned_describe_failure = true;
                    }
                    self.frames_skipped += 1;
                    return;
                }
            }
        }

        let src = source.texture;
        let dst = shared.resource();

        match shared.sync() {
            SyncState::Keyed(mutex) => {
                if let Err(e) = mutex.acquire_sync(self.mutex_key) {
                    tracing::error!("Exporter: {}; frame not copied", e);
                    self.frames_skipped += 1;
                    return;
                }
                queue.copy_resource(src, dst);
                queue.flush_immediate();
                if let Err(e) = mutex.release_sync(self.mutex_key) {
                    tracing::error!("Exporter: {}", e);
                }
            }
            SyncState::Unavailable => {
                if !self.warned_unsynchronized {
                    tracing::warn!(
                        "Exporter: keyed mutex unavailable, copying frames without synchronization"
                    );
                    self.warned_unsynchronized = true;
                }
                queue.copy_resource(src, dst);
                queue.flush_immediate();
            }
            SyncState::SimultaneousAccess => {
                queue.copy_resource(src, dst);
                queue.flush_immediate();
            }
        }

        self.frames_copied += 1;
    }

    /// Release the shared resource and forget the source.
    pub fn release(&mut self) {
        if let Some(shared) = self.shared.take() {
            tracing::info!(
                "Exporter: released shared resource {}",
                shared.share_handle()
            );
        }
        self.source = None;
    }

    pub fn status(&self) -> ExportStatus {
        ExportStatus {
            source: self.source.map(|source| source.texture),
            api: self.shared.as_ref().map(SharedResource::api),
            share_handle: self.shared.as_ref().map(SharedResource::share_handle),
            sync: self.shared.as_ref().map(|shared| shared.sync().kind()),
            generation: self.generation,
            resources_created: self.resources_created,
            frames_copied: self.frames_copied,
            frames_skipped: self.frames_skipped,
        }
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backends: Vec<DeviceApi> = self.backends.iter().map(|b| b.api()).collect();
        f.debug_struct("Exporter")
            .field("backends", &backends)
            .field("source", &self.source)
            .field("shared", &self.shared)
            .field("generation", &self.generation)
            .finish()
    }
}
