// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Cross-process synchronization bound to a shared resource.

use crate::core::Result;

/// Keyed mutex shared between this process and the consumer.
///
/// Implemented by `IDXGIKeyedMutex` on Windows. `acquire_sync` blocks the
/// calling render thread until the peer releases `key`; there is no upper
/// bound. `Ok(())` means the key is held and must be released.
pub trait SyncMutex: Send {
    fn acquire_sync(&self, key: u64) -> Result<()>;

    fn release_sync(&self, key: u64) -> Result<()>;
}
