// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! POSIX platform support.
//!
//! The graphics backends are Windows-only; this side only provides the
//! publication channel so the orchestration can run on development hosts.

pub mod shm;
