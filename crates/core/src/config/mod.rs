use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, TempoSpec};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub clock: ClockConfig,
    pub display: DisplayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Values are only range-checked when converted into engine types, so a
    /// loaded file may still be rejected later by [`ClockConfig::tempo_spec`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Configuration for the beat clock engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    pub bpm: f64,
    pub beats_per_measure: u32,
    pub subdivisions_per_beat: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beats_per_measure: 4,
            subdivisions_per_beat: 1,
        }
    }
}

impl ClockConfig {
    /// Converts the raw values into a validated [`TempoSpec`].
    pub fn tempo_spec(&self) -> Result<TempoSpec> {
        TempoSpec::new(self.bpm, self.beats_per_measure, self.subdivisions_per_beat)
    }
}

/// Configuration for the frame-driven presentation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub frame_rate: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { frame_rate: 60 }
    }
}
