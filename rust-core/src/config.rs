//! Analysis configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! frame_size = 4096
//! overlap = 2048
//! window = "blackman"
//! threshold_db = -70.0
//! bands = [0.0, 500.0, 5000.0, 22050.0]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::analysis::bands::{BandPartition, DEFAULT_BAND_EDGES};
use crate::analysis::cutoff::{Threshold, DEFAULT_THRESHOLD_DB};
use crate::error::{Result, SpectrumError};
use crate::spectrum::{FrameConfig, IntensityScale, PowerScaling, WindowType, DEFAULT_FLOOR_DB};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] SpectrumError),
}

/// Parameters for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Samples per STFT frame
    pub frame_size: usize,

    /// Samples shared by consecutive frames
    pub overlap: usize,

    /// Window applied to each frame
    pub window: WindowType,

    /// Power normalization
    pub scaling: PowerScaling,

    /// Store intensities in dB (true) or linear power (false)
    pub decibels: bool,

    /// Lowest representable dB value; quieter bins are clamped to it
    pub floor_db: f64,

    /// Cutoff threshold in dB, converted to power when `decibels` is false
    pub threshold_db: f64,

    /// Band boundaries in Hz; empty disables band classification
    pub bands: Vec<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            overlap: 1024,
            window: WindowType::Hann,
            scaling: PowerScaling::Spectrum,
            decibels: true,
            floor_db: DEFAULT_FLOOR_DB,
            threshold_db: DEFAULT_THRESHOLD_DB,
            bands: DEFAULT_BAND_EDGES.to_vec(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.frames().validate_window(self.window)?;

        if !self.floor_db.is_finite() {
            return Err(SpectrumError::InvalidConfig {
                field: "floor_db",
                reason: format!("must be finite, got {}", self.floor_db),
            });
        }
        if !self.threshold_db.is_finite() {
            return Err(SpectrumError::InvalidConfig {
                field: "threshold_db",
                reason: format!("must be finite, got {}", self.threshold_db),
            });
        }
        // Every dB bin is at least the floor, so a lower threshold matches silence
        if self.decibels && self.threshold_db < self.floor_db {
            return Err(SpectrumError::InvalidConfig {
                field: "threshold_db",
                reason: format!(
                    "{} dB is below the {} dB floor",
                    self.threshold_db, self.floor_db
                ),
            });
        }

        self.band_partition()?;
        Ok(())
    }

    pub fn frames(&self) -> FrameConfig {
        FrameConfig {
            frame_size: self.frame_size,
            overlap: self.overlap,
        }
    }

    pub fn scale(&self) -> IntensityScale {
        if self.decibels {
            IntensityScale::Decibels {
                floor_db: self.floor_db,
            }
        } else {
            IntensityScale::Power
        }
    }

    /// Threshold in the same unit family as the stored intensities
    pub fn threshold(&self) -> Threshold {
        Threshold::for_scale(self.threshold_db, self.scale())
    }

    /// Validated band partition, `None` when classification is disabled
    pub fn band_partition(&self) -> Result<Option<BandPartition>> {
        if self.bands.is_empty() {
            Ok(None)
        } else {
            BandPartition::new(self.bands.clone()).map(Some)
        }
    }
}
