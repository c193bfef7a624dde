//! Error types for the analysis core

use thiserror::Error;

use crate::spectrum::IntensityUnit;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("invalid frame configuration (frame_size={frame_size}, overlap={overlap}): {reason}")]
    InvalidFrameConfig {
        frame_size: usize,
        overlap: usize,
        reason: &'static str,
    },

    #[error("signal has {len} samples, fewer than one frame of {frame_size}")]
    EmptySignal { len: usize, frame_size: usize },

    #[error("invalid band boundaries {boundaries:?}: {reason}")]
    InvalidBands {
        boundaries: Vec<f64>,
        reason: String,
    },

    #[error("threshold is expressed as {threshold} but the spectrogram stores {intensity}")]
    UnitMismatch {
        threshold: IntensityUnit,
        intensity: IntensityUnit,
    },

    #[error("invalid waveform: {0}")]
    InvalidWaveform(String),

    #[error("invalid configuration field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("FFT processing failed: {0}")]
    Fft(String),
}

pub type Result<T> = std::result::Result<T, SpectrumError>;
