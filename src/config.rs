//! Settings for the event subsystem.
//!
//! All three knobs are fixed at construction time: the queue never
//! resizes and the identifier ranges never move while the subsystem is
//! alive.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from loading or validating [`Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Construction-time settings for an event subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of queued events. Posts beyond this are dropped.
    pub capacity: usize,

    /// End of the system-reserved kind range (closed-open, starts at 0).
    pub reserved_end: u32,

    /// Ceiling of the whole identifier space. Custom kinds live in
    /// `reserved_end..ceiling`.
    pub ceiling: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capacity: 128,
            reserved_end: 0x8000,
            ceiling: 0x1_0000,
        }
    }
}

impl Settings {
    /// Parses settings from a TOML document, falling back to defaults
    /// for absent keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        debug!("Parsed settings: {:?}", settings);
        Ok(settings)
    }

    /// Loads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading event subsystem settings from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1".into()));
        }
        if self.reserved_end >= self.ceiling {
            return Err(ConfigError::Invalid(format!(
                "reserved_end ({}) must leave room below ceiling ({})",
                self.reserved_end, self.ceiling
            )));
        }
        Ok(())
    }
}
