// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Publication channel: hands the current share handle to the consumer process.

mod layout;
#[cfg(any(unix, windows))]
mod shared_memory;

pub use layout::{ChannelLayout, PublishedHandle};
#[cfg(any(unix, windows))]
pub use shared_memory::{SharedMemoryPublisher, SharedMemoryReader};

use crate::core::rhi::ShareHandle;
use crate::core::Result;

/// Writes the current share handle where the consumer can find it.
///
/// Publishing overwrites the previous value; there is no history.
pub trait HandlePublisher: Send {
    /// `generation` increases by one for every successful publish; layouts
    /// without a generation field ignore it.
    fn publish(&mut self, handle: ShareHandle, generation: u64) -> Result<()>;
}
