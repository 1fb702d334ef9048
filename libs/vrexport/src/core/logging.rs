// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Logging setup.
//!
//! The add-on lives inside a host process, so a second `init` (another
//! add-on instance, or a host that already installed a subscriber) is not an
//! error: the existing subscriber is kept.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::core::config::LoggingConfig;
use crate::core::Result;

/// Environment variable holding an `EnvFilter` directive, e.g. `vrexport=debug`.
pub const LOG_ENV_VAR: &str = "VREXPORT_LOG";

pub const LOG_FILE_NAME: &str = "vrexport.log";

/// Keeps the non-blocking file writer flushing for the life of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Returns `Ok(false)` if one was already set.
pub fn init(config: &LoggingConfig) -> Result<bool> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::never(directory, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    let stderr_layer = config
        .directory
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Logging initialized (level '{}')", config.level);
    }
    Ok(installed)
}
