// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! In-memory device, host and channel doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use vrexport::{
    CommandQueue, DeviceApi, DeviceHandle, EffectRuntime, EffectVariableHandle,
    EffectsReloadedHook, ExportError, Exporter, FrameFinishedHook, GpuResource, HandlePublisher,
    KeyedMutexApi, KeyedMutexBackend, RenderEvents, ResourceHandle, ResourceViewHandle, Result,
    ShareHandle, SimultaneousAccessApi, SimultaneousAccessBackend, SyncMutex, TextureBinding,
    TextureDesc,
};

pub const DEVICE: DeviceHandle = DeviceHandle(0xD3D);

// =============================================================================
// Device
// =============================================================================

/// Everything observable about the fake GPU, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created(ResourceHandle),
    Released(ResourceHandle),
    Acquire,
    Release,
    Copy {
        src: ResourceHandle,
        dst: ResourceHandle,
    },
    Flush,
    ConsumerAcquired,
    ConsumerReleased,
}

/// A keyed mutex both the producer and a simulated consumer can take.
#[derive(Default)]
pub struct KeyedLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl KeyedLock {
    /// Blocks until the lock is free.
    pub fn acquire(&self) {
        let mut held = self.held.lock();
        while *held {
            self.released.wait(&mut held);
        }
        *held = true;
    }

    pub fn release(&self) {
        *self.held.lock() = false;
        self.released.notify_all();
    }
}

#[derive(Default)]
pub struct DeviceState {
    sources: Mutex<HashMap<ResourceHandle, TextureDesc>>,
    pub events: Mutex<Vec<Event>>,
    pub lock: KeyedLock,
    pub fail_allocation: AtomicBool,
    pub fail_keyed_mutex: AtomicBool,
    pub fail_shared_handle: AtomicBool,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    next_resource: AtomicU64,
}

impl DeviceState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make a host texture with `desc` known to the device.
    pub fn set_source(&self, texture: ResourceHandle, desc: TextureDesc) {
        self.sources.lock().insert(texture, desc);
    }

    /// The host texture disappears; describing it fails from now on.
    pub fn forget_source(&self, texture: ResourceHandle) {
        self.sources.lock().remove(&texture);
    }

    pub fn record(&self, event: Event) {
        self.events.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|event| matches(event)).count()
    }

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc> {
        self.sources
            .lock()
            .get(&source)
            .cloned()
            .ok_or_else(|| {
                ExportError::CapabilityQuery(format!("unknown texture {:?}", source))
            })
    }

    fn allocate(self: &Arc<Self>) -> Result<FakeTexture> {
        if self.fail_allocation.load(Ordering::SeqCst) {
            return Err(ExportError::Allocation("E_OUTOFMEMORY".to_string()));
        }
        let handle = ResourceHandle(0x1000 + self.next_resource.fetch_add(1, Ordering::SeqCst));
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        self.record(Event::Created(handle));
        Ok(FakeTexture {
            handle,
            state: Arc::clone(self),
        })
    }
}

pub struct FakeTexture {
    handle: ResourceHandle,
    state: Arc<DeviceState>,
}

impl GpuResource for FakeTexture {
    fn handle(&self) -> ResourceHandle {
        self.handle
    }
}

impl Drop for FakeTexture {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
        self.state.record(Event::Released(self.handle));
    }
}

pub struct FakeKeyedMutex {
    state: Arc<DeviceState>,
}

impl SyncMutex for FakeKeyedMutex {
    fn acquire_sync(&self, _key: u64) -> Result<()> {
        self.state.lock.acquire();
        self.state.record(Event::Acquire);
        Ok(())
    }

    fn release_sync(&self, _key: u64) -> Result<()> {
        self.state.record(Event::Release);
        self.state.lock.release();
        Ok(())
    }
}

fn share_handle_for(texture: &FakeTexture) -> ShareHandle {
    ShareHandle(0x40_0000 + texture.handle.0)
}

/// Keyed-mutex device calls.
pub struct FakeD3D11 {
    pub state: Arc<DeviceState>,
}

impl KeyedMutexApi for FakeD3D11 {
    type Texture = FakeTexture;
    type Mutex = FakeKeyedMutex;

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc> {
        self.state.describe(source)
    }

    fn create_texture(&self, _device: DeviceHandle, _desc: &TextureDesc) -> Result<FakeTexture> {
        self.state.allocate()
    }

    fn keyed_mutex(&self, _texture: &FakeTexture) -> Result<FakeKeyedMutex> {
        if self.state.fail_keyed_mutex.load(Ordering::SeqCst) {
            return Err(ExportError::CapabilityQuery(
                "QueryInterface(IDXGIKeyedMutex): E_NOINTERFACE".to_string(),
            ));
        }
        Ok(FakeKeyedMutex {
            state: Arc::clone(&self.state),
        })
    }

    fn shared_handle(&self, texture: &FakeTexture) -> Result<ShareHandle> {
        if self.state.fail_shared_handle.load(Ordering::SeqCst) {
            return Err(ExportError::HandleExport("GetSharedHandle: E_FAIL".to_string()));
        }
        Ok(share_handle_for(texture))
    }
}

/// Simultaneous-access device calls.
pub struct FakeD3D12 {
    pub state: Arc<DeviceState>,
}

impl SimultaneousAccessApi for FakeD3D12 {
    type Resource = FakeTexture;

    fn describe(&self, source: ResourceHandle) -> Result<TextureDesc> {
        self.state.describe(source)
    }

    fn create_committed_resource(
        &self,
        _device: DeviceHandle,
        _desc: &TextureDesc,
    ) -> Result<FakeTexture> {
        self.state.allocate()
    }

    fn create_shared_handle(
        &self,
        _device: DeviceHandle,
        resource: &FakeTexture,
    ) -> Result<ShareHandle> {
        if self.state.fail_shared_handle.load(Ordering::SeqCst) {
            return Err(ExportError::HandleExport(
                "CreateSharedHandle: E_ACCESSDENIED".to_string(),
            ));
        }
        Ok(share_handle_for(resource))
    }
}

/// The host's immediate command list.
pub struct FakeQueue {
    pub state: Arc<DeviceState>,
}

impl CommandQueue for FakeQueue {
    fn copy_resource(&mut self, src: ResourceHandle, dst: ResourceHandle) {
        self.state.record(Event::Copy { src, dst });
    }

    fn flush_immediate(&mut self) {
        self.state.record(Event::Flush);
    }
}

// =============================================================================
// Publication
// =============================================================================

#[derive(Clone, Default)]
pub struct RecordingPublisher {
    pub published: Arc<Mutex<Vec<(ShareHandle, u64)>>>,
    pub fail: Arc<AtomicBool>,
}

impl RecordingPublisher {
    pub fn last(&self) -> Option<(ShareHandle, u64)> {
        self.published.lock().last().copied()
    }
}

impl HandlePublisher for RecordingPublisher {
    fn publish(&mut self, handle: ShareHandle, generation: u64) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExportError::SharedMemory {
                operation: "mapping creation",
                code: 5,
            });
        }
        self.published.lock().push((handle, generation));
        Ok(())
    }
}

/// Exporter with both fake backends on one device.
pub fn exporter(state: &Arc<DeviceState>, publisher: Box<dyn HandlePublisher>) -> Exporter {
    Exporter::new(publisher)
        .with_backend(Box::new(KeyedMutexBackend::new(FakeD3D11 {
            state: Arc::clone(state),
        })))
        .with_backend(Box::new(SimultaneousAccessBackend::new(FakeD3D12 {
            state: Arc::clone(state),
        })))
}

// =============================================================================
// Host
// =============================================================================

/// Effect runtime exposing one texture variable.
pub struct FakeRuntime {
    pub api: DeviceApi,
    pub effect: &'static str,
    pub variable: &'static str,
    pub texture: ResourceHandle,
}

impl EffectRuntime for FakeRuntime {
    fn device_api(&self) -> Option<DeviceApi> {
        Some(self.api)
    }

    fn native_device(&self) -> DeviceHandle {
        DEVICE
    }

    fn find_texture_variable(
        &self,
        effect: &str,
        variable: &str,
    ) -> Option<EffectVariableHandle> {
        (effect == self.effect && variable == self.variable).then_some(EffectVariableHandle(1))
    }

    fn texture_binding(&self, _variable: EffectVariableHandle) -> TextureBinding {
        TextureBinding {
            view: ResourceViewHandle(0x77),
            srgb_view: ResourceViewHandle::NULL,
        }
    }

    fn resource_from_view(&self, _view: ResourceViewHandle) -> ResourceHandle {
        self.texture
    }
}

#[derive(Default)]
pub struct FakeEvents {
    pub effects_reloaded: Vec<EffectsReloadedHook>,
    pub frame_finished: Vec<FrameFinishedHook>,
}

impl FakeEvents {
    pub fn reload_effects(&mut self, runtime: &dyn EffectRuntime) {
        for hook in &mut self.effects_reloaded {
            hook(runtime);
        }
    }

    pub fn finish_frame(&mut self, queue: &mut dyn CommandQueue) {
        for hook in &mut self.frame_finished {
            hook(&mut *queue);
        }
    }
}

impl RenderEvents for FakeEvents {
    fn register_effects_reloaded(&mut self, hook: EffectsReloadedHook) {
        self.effects_reloaded.push(hook);
    }

    fn register_frame_finished(&mut self, hook: FrameFinishedHook) {
        self.frame_finished.push(hook);
    }

    fn unregister_all(&mut self) {
        self.effects_reloaded.clear();
        self.frame_finished.clear();
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Collects `tracing` events emitted while [`CapturedLogs::capture`] runs.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CapturedLogs {
    /// Run `f` with this collector as the thread's subscriber.
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn count(&self, level: Level) -> usize {
        self.records.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut message = MessageVisitor::default();
        event.record(&mut message);
        self.records.lock().push((*event.metadata().level(), message.0));
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}
