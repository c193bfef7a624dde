//! Decoded sample buffer handed to the analysis pipeline

use std::borrow::Cow;

use crate::error::{Result, SpectrumError};

/// Interleaved PCM samples tagged with channel count and sample rate
///
/// The buffer is never modified by analysis. Downmixing produces a new mono
/// buffer (or borrows the existing one when it is already mono).
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
    channels: usize,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from interleaved samples
    ///
    /// # Arguments
    /// * `samples` - Interleaved samples, `channels` values per frame
    /// * `channels` - Number of channels (1 = mono, 2 = stereo, ...)
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(samples: Vec<f64>, channels: usize, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SpectrumError::InvalidWaveform(
                "sample rate must be positive".into(),
            ));
        }
        if channels == 0 {
            return Err(SpectrumError::InvalidWaveform(
                "channel count must be positive".into(),
            ));
        }
        if samples.len() % channels != 0 {
            return Err(SpectrumError::InvalidWaveform(format!(
                "{} samples do not split evenly into {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Create a single-channel waveform
    pub fn mono(samples: Vec<f64>, sample_rate: u32) -> Result<Self> {
        Self::from_interleaved(samples, 1, sample_rate)
    }

    /// Create a waveform from one buffer per channel
    ///
    /// All channels must have the same length.
    pub fn from_channels(channels: &[Vec<f64>], sample_rate: u32) -> Result<Self> {
        let Some(first) = channels.first() else {
            return Err(SpectrumError::InvalidWaveform(
                "at least one channel is required".into(),
            ));
        };

        let frames = first.len();
        if let Some((index, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(SpectrumError::InvalidWaveform(format!(
                "channel {} has {} samples, channel 0 has {}",
                index,
                ch.len(),
                frames
            )));
        }

        let mut samples = Vec::with_capacity(frames * channels.len());
        for i in 0..frames {
            samples.extend(channels.iter().map(|ch| ch[i]));
        }

        Self::from_interleaved(samples, channels.len(), sample_rate)
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Channel-wise mean of every frame
    pub fn to_mono(&self) -> Cow<'_, [f64]> {
        if self.channels == 1 {
            return Cow::Borrowed(&self.samples);
        }

        let scale = 1.0 / self.channels as f64;
        Cow::Owned(
            self.samples
                .chunks_exact(self.channels)
                .map(|frame| frame.iter().sum::<f64>() * scale)
                .collect(),
        )
    }
}
