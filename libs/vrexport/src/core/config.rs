// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Add-on configuration.
//!
//! Read from an optional `vrexport.toml` next to the add-on module. Every
//! field has a default, so an empty or missing file behaves like the stock
//! add-on.
//!
//! ```toml
//! channel_layout = "handle_with_generation"
//! mutex_key = 0
//!
//! [[texture_candidates]]
//! effect = "3DToElse.fx"
//! variable = "V__texTOT"
//!
//! [logging]
//! level = "debug"
//! directory = "C:/Games/MyGame/logs"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::publication::ChannelLayout;
use crate::core::{ExportError, Result};

/// File name looked up next to the add-on module.
pub const CONFIG_FILE_NAME: &str = "vrexport.toml";

/// Name of the shared-memory block viewers poll for the share handle.
#[cfg(windows)]
pub const DEFAULT_CHANNEL_NAME: &str = "Local\\KatangaMappedFile";
#[cfg(not(windows))]
pub const DEFAULT_CHANNEL_NAME: &str = "/KatangaMappedFile";

/// Kernel object name of the D3D12 shared handle.
pub const DEFAULT_D3D12_SHARED_HANDLE_NAME: &str = "DX12VRStream";

/// An effect texture variable that may hold the frame to export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureVariable {
    /// Effect file name, e.g. `3DToElse.fx`.
    pub effect: String,
    /// Texture variable inside that effect.
    pub variable: String,
}

impl TextureVariable {
    pub fn new(effect: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            effect: effect.into(),
            variable: variable.into(),
        }
    }
}

impl std::fmt::Display for TextureVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.effect, self.variable)
    }
}

/// Logging output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `VREXPORT_LOG` is unset.
    pub level: String,
    /// Directory for `vrexport.log`. Logs go to stderr when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Texture variables to export, tried in order; the first one found wins.
    pub texture_candidates: Vec<TextureVariable>,
    pub channel_name: String,
    pub channel_layout: ChannelLayout,
    /// `None` exports an unnamed handle.
    pub d3d12_shared_handle_name: Option<String>,
    /// Key passed to `AcquireSync`/`ReleaseSync`. The wait is always unbounded.
    pub mutex_key: u64,
    pub logging: LoggingConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            texture_candidates: vec![
                TextureVariable::new("3DToElse.fx", "V__texTOT"),
                TextureVariable::new("SuperDepth3D_VR+.fx", "V__DoubleTex"),
            ],
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            channel_layout: ChannelLayout::default(),
            d3d12_shared_handle_name: Some(DEFAULT_D3D12_SHARED_HANDLE_NAME.to_string()),
            mutex_key: 0,
            logging: LoggingConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| ExportError::Configuration(format!("vrexport.toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_toml_str(&source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load `vrexport.toml` from `directory`.
    pub fn load_from_dir(directory: &Path) -> Result<Self> {
        Self::load(&directory.join(CONFIG_FILE_NAME))
    }

    fn validate(&self) -> Result<()> {
        if self.channel_name.is_empty() {
            return Err(ExportError::Configuration(
                "channel_name must not be empty".to_string(),
            ));
        }
        if self.texture_candidates.is_empty() {
            return Err(ExportError::Configuration(
                "texture_candidates must list at least one effect variable".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_add_on() {
        let config = ExportConfig::default();
        assert_eq!(config.texture_candidates.len(), 2);
        assert_eq!(config.texture_candidates[0].to_string(), "3DToElse.fx::V__texTOT");
        assert_eq!(config.channel_layout, ChannelLayout::HandleOnly);
        assert_eq!(config.mutex_key, 0);
        assert_eq!(config.d3d12_shared_handle_name.as_deref(), Some("DX12VRStream"));
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ExportConfig::from_toml_str("").unwrap(), ExportConfig::default());
    }

    #[test]
    fn parses_overrides() {
        let config = ExportConfig::from_toml_str(
            r#"
            channel_name = "Local\\MyViewer"
            channel_layout = "handle_with_generation"
            mutex_key = 1

            [[texture_candidates]]
            effect = "Custom.fx"
            variable = "OutTex"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.channel_name, "Local\\MyViewer");
        assert_eq!(config.channel_layout, ChannelLayout::HandleWithGeneration);
        assert_eq!(config.mutex_key, 1);
        assert_eq!(config.texture_candidates, vec![TextureVariable::new("Custom.fx", "OutTex")]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn rejects_empty_candidate_list() {
        let err = ExportConfig::from_toml_str("texture_candidates = []").unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        // The keyed-mutex wait is unbounded; there is no timeout to configure.
        let err = ExportConfig::from_toml_str("acquire_timeout = { millis = 1 }").unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config, ExportConfig::default());
    }

    #[test]
    fn malformed_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "channel_layout = 7").unwrap();
        let err = ExportConfig::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
    }
}
