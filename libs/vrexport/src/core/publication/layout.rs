// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Byte layout of the publication channel.
//!
//! ```text
//! HandleOnly              HandleWithGeneration
//! +0  u64 share handle    +0  u64 share handle
//!                         +8  u64 generation
//! ```
//!
//! All values native endian. Viewers that only understand the handle-only
//! layout still read a valid handle from the extended layout.

use serde::{Deserialize, Serialize};

use crate::core::rhi::ShareHandle;

pub(crate) const HANDLE_OFFSET: usize = 0;
pub(crate) const GENERATION_OFFSET: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLayout {
    /// Exactly one handle value.
    #[default]
    HandleOnly,
    /// Handle followed by a generation counter, so a consumer can tell that
    /// the handle changed (for example after a resize) between two polls.
    HandleWithGeneration,
}

impl ChannelLayout {
    /// Size of the shared-memory region in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::HandleOnly => std::mem::size_of::<u64>(),
            Self::HandleWithGeneration => 2 * std::mem::size_of::<u64>(),
        }
    }

    pub fn has_generation(&self) -> bool {
        matches!(self, Self::HandleWithGeneration)
    }
}

/// What a consumer reads back from the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishedHandle {
    pub handle: ShareHandle,
    /// `None` for [`ChannelLayout::HandleOnly`].
    pub generation: Option<u64>,
}
