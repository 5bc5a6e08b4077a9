//! Runtime synthesis settings.
//!
//! Settings can be built in code or read from TOML:
//!
//! ```toml
//! output_rate = 48000
//! control_ratio = 48
//! envelope = true
//! tremolo = true
//! vibrato = true
//! cutoff = false
//! pre_resample = true
//! reopen_per_lookup = false
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default playback rate in Hz.
pub const DEFAULT_OUTPUT_RATE: u32 = 44_100;

/// Largest accepted control ratio.
pub const MAX_CONTROL_RATIO: u32 = 255;

/// Settings that shape how voices are compiled and materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Playback rate of the host engine in Hz
    pub output_rate: u32,
    /// Samples per control update. Derived from the output rate when unset.
    pub control_ratio: Option<u32>,
    /// Build volume envelopes for looping samples
    pub envelope: bool,
    /// Build tremolo parameters from the modulation LFO
    pub tremolo: bool,
    /// Build vibrato parameters from the vibrato LFO
    pub vibrato: bool,
    /// Apply the load-time low-pass filter
    pub cutoff: bool,
    /// Pre-resample fixed-pitch (drum) samples to the output rate
    pub pre_resample: bool,
    /// Close bank files after each materialization and reopen on demand
    pub reopen_per_lookup: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            output_rate: DEFAULT_OUTPUT_RATE,
            control_ratio: None,
            envelope: true,
            tremolo: true,
            vibrato: true,
            cutoff: false,
            pre_resample: true,
            reopen_per_lookup: false,
        }
    }
}

impl SynthConfig {
    /// Parse settings from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SynthConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Config(format!("Config file not found at {:?}", path)));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load settings or fall back to defaults when the file is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default synth settings: {}", e);
                Self::default()
            }
        }
    }

    /// Serialize settings to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that the settings describe a usable engine.
    pub fn validate(&self) -> Result<()> {
        if self.output_rate == 0 {
            return Err(Error::Config("output_rate must be positive".to_string()));
        }
        if let Some(ratio) = self.control_ratio {
            if ratio == 0 || ratio > MAX_CONTROL_RATIO {
                return Err(Error::Config(format!(
                    "control_ratio must be within 1..={}, got {}",
                    MAX_CONTROL_RATIO, ratio
                )));
            }
        }
        Ok(())
    }

    /// Samples per control update: the explicit setting, or one millisecond
    /// of output clamped to 1..=255.
    pub fn control_ratio(&self) -> u32 {
        self.control_ratio
            .unwrap_or(self.output_rate / 1000)
            .clamp(1, MAX_CONTROL_RATIO)
    }
}
