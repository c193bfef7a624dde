//! Spectrogram assembly
//!
//! Stacks per-frame power spectra into a `[frequency][time]` matrix and
//! converts it to the requested intensity scale.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::stft::{FrameConfig, FrameSpectra};
use crate::error::{Result, SpectrumError};

/// Default noise floor for dB intensities
pub const DEFAULT_FLOOR_DB: f64 = -120.0;

/// Unit family of an intensity value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityUnit {
    Power,
    Decibels,
}

impl fmt::Display for IntensityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntensityUnit::Power => "linear power",
            IntensityUnit::Decibels => "decibels",
        })
    }
}

/// Representation of the values stored in a spectrogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IntensityScale {
    /// Linear power, as produced by the FFT engine
    Power,

    /// 10·log10(power), clamped from below at `floor_db`
    Decibels { floor_db: f64 },
}

impl Default for IntensityScale {
    fn default() -> Self {
        IntensityScale::Decibels {
            floor_db: DEFAULT_FLOOR_DB,
        }
    }
}

impl IntensityScale {
    pub fn unit(&self) -> IntensityUnit {
        match self {
            IntensityScale::Power => IntensityUnit::Power,
            IntensityScale::Decibels { .. } => IntensityUnit::Decibels,
        }
    }

    /// Map a linear power value into this scale
    pub fn from_power(&self, power: f64) -> f64 {
        match *self {
            IntensityScale::Power => power,
            IntensityScale::Decibels { floor_db } => power_to_db(power, floor_db),
        }
    }

    /// Map a value in this scale back to linear power
    pub fn to_power(&self, value: f64) -> f64 {
        match self {
            IntensityScale::Power => value,
            IntensityScale::Decibels { .. } => db_to_power(value),
        }
    }
}

/// Convert power to decibels, clamping to `floor_db`
///
/// Zero, negative and non-finite-low inputs all land on the floor.
pub fn power_to_db(power: f64, floor_db: f64) -> f64 {
    if power > 0.0 {
        (10.0 * power.log10()).max(floor_db)
    } else {
        floor_db
    }
}

/// Convert decibels back to linear power
pub fn db_to_power(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Time-frequency intensity representation of one signal
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    frequencies: Array1<f64>,
    times: Array1<f64>,
    intensity: Array2<f64>,
    scale: IntensityScale,
    sample_rate: u32,
    frames: FrameConfig,
}

impl Spectrogram {
    /// Assemble per-frame spectra into a spectrogram
    ///
    /// Frequency bin k sits at `k·sr/N`; time bin j at the center of frame j.
    pub fn assemble(spectra: &FrameSpectra, scale: IntensityScale) -> Result<Self> {
        let frames = spectra.frames;
        frames.validate()?;

        if spectra.sample_rate == 0 {
            return Err(SpectrumError::InvalidWaveform(
                "sample rate must be positive".into(),
            ));
        }
        if let IntensityScale::Decibels { floor_db } = scale {
            if !floor_db.is_finite() {
                return Err(SpectrumError::InvalidConfig {
                    field: "floor_db",
                    reason: format!("must be finite, got {}", floor_db),
                });
            }
        }

        let num_bins = frames.num_bins();
        let num_frames = spectra.num_frames();
        if num_frames == 0 {
            return Err(SpectrumError::EmptySignal {
                len: 0,
                frame_size: frames.frame_size,
            });
        }

        let sample_rate = spectra.sample_rate;
        let frequencies = Array1::from_iter((0..num_bins).map(|k| frames.bin_to_hz(k, sample_rate)));
        let times = Array1::from_iter(
            (0..num_frames).map(|j| frames.frame_center_secs(j, sample_rate)),
        );

        let mut intensity = Array2::zeros((num_bins, num_frames));
        for (mut column, spectrum) in intensity.axis_iter_mut(Axis(1)).zip(&spectra.spectra) {
            if spectrum.len() != num_bins {
                return Err(SpectrumError::Fft(format!(
                    "frame spectrum has {} bins, expected {}",
                    spectrum.len(),
                    num_bins
                )));
            }
            for (cell, &power) in column.iter_mut().zip(spectrum) {
                *cell = scale.from_power(power);
            }
        }

        Ok(Self {
            frequencies,
            times,
            intensity,
            scale,
            sample_rate,
            frames,
        })
    }

    /// Frequency of each bin in Hz, ascending from DC
    pub fn frequencies(&self) -> ArrayView1<'_, f64> {
        self.frequencies.view()
    }

    /// Center time of each frame in seconds, ascending
    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    /// Intensity matrix indexed `[frequency_bin, time_bin]`
    pub fn intensity(&self) -> &Array2<f64> {
        &self.intensity
    }

    pub fn scale(&self) -> IntensityScale {
        self.scale
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> FrameConfig {
        self.frames
    }

    pub fn num_bins(&self) -> usize {
        self.frequencies.len()
    }

    pub fn num_frames(&self) -> usize {
        self.times.len()
    }

    /// Spacing between adjacent frequency bins in Hz
    pub fn bin_width_hz(&self) -> f64 {
        self.frames.bin_to_hz(1, self.sample_rate)
    }

    /// Span of signal covered by the analyzed frames, in seconds
    pub fn duration(&self) -> f64 {
        let covered = self.frames.frame_start(self.num_frames() - 1) + self.frames.frame_size;
        covered as f64 / self.sample_rate as f64
    }

    /// Arithmetic mean of each frequency bin across all time bins
    pub fn average_intensity(&self) -> Array1<f64> {
        self.intensity
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(self.num_bins()))
    }
}
