//! Effective bandwidth (cutoff frequency) estimation
//!
//! Lossy encoders low-pass the signal before compressing it, so a file
//! transcoded from a lossy source shows almost no energy above a fixed
//! frequency. The highest bin whose time-averaged intensity still clears a
//! noise threshold approximates that frequency.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectrumError};
use crate::spectrum::{db_to_power, IntensityScale, IntensityUnit, Spectrogram};

/// Default noise threshold in dB
pub const DEFAULT_THRESHOLD_DB: f64 = -60.0;

/// Intensity threshold, tagged with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    Decibels(f64),
    Power(f64),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Decibels(DEFAULT_THRESHOLD_DB)
    }
}

impl Threshold {
    /// Express a dB threshold in the unit family of `scale`
    pub fn for_scale(threshold_db: f64, scale: IntensityScale) -> Self {
        match scale {
            IntensityScale::Power => Threshold::Power(db_to_power(threshold_db)),
            IntensityScale::Decibels { .. } => Threshold::Decibels(threshold_db),
        }
    }

    pub fn unit(&self) -> IntensityUnit {
        match self {
            Threshold::Decibels(_) => IntensityUnit::Decibels,
            Threshold::Power(_) => IntensityUnit::Power,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            Threshold::Decibels(v) | Threshold::Power(v) => v,
        }
    }

    /// Raw threshold value, provided it matches `scale`
    pub fn checked_value(&self, scale: IntensityScale) -> Result<f64> {
        if self.unit() != scale.unit() {
            return Err(SpectrumError::UnitMismatch {
                threshold: self.unit(),
                intensity: scale.unit(),
            });
        }
        Ok(self.value())
    }
}

/// Result of cutoff estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Cutoff {
    /// Highest bin above the threshold
    Found { frequency_hz: f64, bin: usize },

    /// Nothing above the threshold (silence or fully attenuated signal)
    NotFound,
}

impl Cutoff {
    /// Cutoff in Hz, 0.0 when nothing was found
    pub fn hz(&self) -> f64 {
        match *self {
            Cutoff::Found { frequency_hz, .. } => frequency_hz,
            Cutoff::NotFound => 0.0,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Cutoff::Found { .. })
    }
}

/// Find the highest frequency whose averaged intensity exceeds `threshold`
///
/// `averaged` and `frequencies` must be the same length and in the same
/// unit family as `threshold`. The comparison is strict.
pub fn find_cutoff(
    frequencies: ArrayView1<'_, f64>,
    averaged: ArrayView1<'_, f64>,
    threshold: f64,
) -> Cutoff {
    debug_assert_eq!(frequencies.len(), averaged.len());

    averaged
        .iter()
        .zip(frequencies.iter())
        .enumerate()
        .rev()
        .find(|&(_, (&level, _))| level > threshold)
        .map(|(bin, (_, &frequency_hz))| Cutoff::Found { frequency_hz, bin })
        .unwrap_or(Cutoff::NotFound)
}

/// Estimate the cutoff frequency of a spectrogram
///
/// # Errors
/// `UnitMismatch` when `threshold` is not in the spectrogram's unit family
pub fn estimate_cutoff(spectrogram: &Spectrogram, threshold: Threshold) -> Result<Cutoff> {
    let limit = threshold.checked_value(spectrogram.scale())?;
    let averaged = spectrogram.average_intensity();
    Ok(find_cutoff(spectrogram.frequencies(), averaged.view(), limit))
}
