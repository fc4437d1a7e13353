//! Configuration for the hardware façade.

use std::path::Path;

use serde::Deserialize;

use crate::mixer::{ControlValue, RouteProgram};
use crate::ConfigError;

/// Which devices to open and how to route them.
///
/// Use [`HalConfig::default()`] for the Speyside board, or load a table for
/// another board with [`HalConfig::load`].
///
/// # Example
///
/// ```
/// use tiny_audio_hal::HalConfig;
///
/// let config = HalConfig::from_toml_str(
///     r#"
///     card = 1
///
///     [[route]]
///     name = "Speaker Switch"
///     value = 1
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.card, 1);
/// assert_eq!(config.route.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HalConfig {
    /// Sound card of the playback PCM.
    ///
    /// Default: 0
    pub card: u32,

    /// PCM device number on the card.
    ///
    /// Default: 0
    pub device: u32,

    /// Card index of the mixer.
    ///
    /// Default: 0
    pub mixer: u32,

    /// Control writes applied on every output open.
    ///
    /// Default: [`RouteProgram::speyside()`]
    pub route: RouteProgram,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            card: 0,
            device: 0,
            mixer: 0,
            route: RouteProgram::speyside(),
        }
    }
}

impl HalConfig {
    /// Parses and validates a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), writes = config.route.len(), "loaded HAL config");
        Ok(config)
    }

    /// Checks that every route entry names a control and carries a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, write) in self.route.writes().iter().enumerate() {
            if write.name.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "route entry {i} has an empty control name"
                )));
            }
            if matches!(&write.value, ControlValue::Enumerated(item) if item.is_empty()) {
                return Err(ConfigError::invalid(format!(
                    "route entry {i} ({}) has an empty enum item",
                    write.name
                )));
            }
        }
        Ok(())
    }
}
