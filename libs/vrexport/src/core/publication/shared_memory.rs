// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Named shared-memory publication channel.

use std::sync::atomic::{fence, Ordering};

use super::layout::{ChannelLayout, PublishedHandle, GENERATION_OFFSET, HANDLE_OFFSET};
use super::HandlePublisher;
use crate::core::rhi::ShareHandle;
use crate::core::Result;

#[cfg(unix)]
use crate::posix::shm::NamedMapping;
#[cfg(windows)]
use crate::win32::shared_memory::NamedMapping;

/// Producer side of the channel.
///
/// The mapping is created on the first publish and then kept mapped, so
/// republishing is a plain write into the view.
pub struct SharedMemoryPublisher {
    name: String,
    layout: ChannelLayout,
    mapping: Option<NamedMapping>,
}

impl SharedMemoryPublisher {
    pub fn new(name: impl Into<String>, layout: ChannelLayout) -> Self {
        Self {
            name: name.into(),
            layout,
            mapping: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the named mapping exists in this process yet.
    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    fn mapping(&mut self) -> Result<&NamedMapping> {
        let mapping = match self.mapping.take() {
            Some(mapping) => mapping,
            None => {
                let mapping = NamedMapping::create(&self.name, self.layout.size())?;
                tracing::debug!(
                    "SharedMemoryPublisher: mapped '{}' ({} bytes)",
                    self.name,
                    self.layout.size()
                );
                mapping
            }
        };
        Ok(self.mapping.insert(mapping))
    }
}

impl HandlePublisher for SharedMemoryPublisher {
    fn publish(&mut self, handle: ShareHandle, generation: u64) -> Result<()> {
        let layout = self.layout;
        let mapping = self.mapping()?;

        // Handle first: a reader that sees the new generation also sees the new handle.
        mapping.write_u64(HANDLE_OFFSET, handle.0);
        if layout.has_generation() {
            fence(Ordering::Release);
            mapping.write_u64(GENERATION_OFFSET, generation);
        }
        Ok(())
    }
}

impl std::fmt::Debug for SharedMemoryPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemoryPublisher")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("mapped", &self.mapping.is_some())
            .finish()
    }
}

/// Consumer side of the channel: read-only view of an existing mapping.
pub struct SharedMemoryReader {
    layout: ChannelLayout,
    mapping: NamedMapping,
}

impl SharedMemoryReader {
    /// Open a channel some producer already created.
    pub fn open(name: &str, layout: ChannelLayout) -> Result<Self> {
        let mapping = NamedMapping::open_read_only(name, layout.size())?;
        Ok(Self { layout, mapping })
    }

    /// Read the current contents. Values may be stale; poll again to revalidate.
    pub fn read(&self) -> PublishedHandle {
        let generation = self
            .layout
            .has_generation()
            .then(|| self.mapping.read_u64(GENERATION_OFFSET));
        fence(Ordering::Acquire);
        PublishedHandle {
            handle: ShareHandle(self.mapping.read_u64(HANDLE_OFFSET)),
            generation,
        }
    }
}
