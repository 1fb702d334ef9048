// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Host command submission path.

use super::handles::ResourceHandle;

/// The host's immediate command list, handed over with every
/// "frame finished" event.
///
/// Copies are recorded on the host's own queue so they are ordered with the
/// frame that produced the source texture.
pub trait CommandQueue {
    /// Record a full-resource copy. Both resources must be copy compatible.
    fn copy_resource(&mut self, src: ResourceHandle, dst: ResourceHandle);

    /// Submit everything recorded so far without waiting for the next frame.
    fn flush_immediate(&mut self);
}
