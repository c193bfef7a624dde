//! Short-time Fourier transform over a mono sample buffer
//!
//! Frames advance by `frame_size - overlap` samples. A trailing frame that would
//! run past the end of the buffer is dropped rather than zero-padded.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::fft::{scale_power, FftEngine, PowerScaling};
use super::windowing::{apply_window_into, generate_window, window_power_sum, window_sum, WindowType};
use crate::error::{Result, SpectrumError};

/// Frame geometry for the STFT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Samples per frame (N); a power of two is fastest but not required
    pub frame_size: usize,

    /// Samples shared with the previous frame (O), O < N
    pub overlap: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            overlap: 1024,
        }
    }
}

impl FrameConfig {
    /// Build and validate a frame configuration
    pub fn new(frame_size: usize, overlap: usize) -> Result<Self> {
        let config = Self {
            frame_size,
            overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let reason = if self.frame_size == 0 {
            "frame_size must be positive"
        } else if self.overlap >= self.frame_size {
            "overlap must be smaller than frame_size"
        } else {
            return Ok(());
        };

        Err(SpectrumError::InvalidFrameConfig {
            frame_size: self.frame_size,
            overlap: self.overlap,
            reason,
        })
    }

    /// Distance between consecutive frame starts
    pub fn hop(&self) -> usize {
        self.frame_size - self.overlap
    }

    /// Number of whole frames that fit in `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.frame_size {
            0
        } else {
            (len - self.frame_size) / self.hop() + 1
        }
    }

    /// First sample of frame `index`
    pub fn frame_start(&self, index: usize) -> usize {
        index * self.hop()
    }

    /// Center of frame `index` in seconds
    pub fn frame_center_secs(&self, index: usize, sample_rate: u32) -> f64 {
        (self.frame_start(index) as f64 + self.frame_size as f64 / 2.0) / sample_rate as f64
    }

    /// Number of non-negative frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Frequency of bin `k` in Hz
    pub fn bin_to_hz(&self, bin: usize, sample_rate: u32) -> f64 {
        bin as f64 * sample_rate as f64 / self.frame_size as f64
    }

    /// Check that `window_type` keeps some energy at this frame size
    ///
    /// Symmetric Hann and Blackman windows of two samples are all zeros, which
    /// would make every normalized bin NaN.
    pub fn validate_window(&self, window_type: WindowType) -> Result<()> {
        self.validate()?;
        let window = generate_window(window_type, self.frame_size);
        check_window_energy(self, window_type, &window)
    }
}

fn check_window_energy(frames: &FrameConfig, window_type: WindowType, window: &[f64]) -> Result<()> {
    if window_sum(window) > 0.0 && window_power_sum(window) > 0.0 {
        return Ok(());
    }

    Err(SpectrumError::InvalidFrameConfig {
        frame_size: frames.frame_size,
        overlap: frames.overlap,
        reason: match window_type {
            WindowType::Hann => "hann window has zero energy at this frame_size",
            WindowType::Hamming => "hamming window has zero energy at this frame_size",
            WindowType::Blackman => "blackman window has zero energy at this frame_size",
            WindowType::Rectangular => "rectangular window has zero energy at this frame_size",
        },
    })
}

/// Power spectra of every frame, in frame order
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpectra {
    pub frames: FrameConfig,
    pub sample_rate: u32,
    pub window: WindowType,
    pub scaling: PowerScaling,

    /// One power spectrum (`num_bins` entries) per frame
    pub spectra: Vec<Vec<f64>>,
}

impl FrameSpectra {
    pub fn num_frames(&self) -> usize {
        self.spectra.len()
    }
}

/// Windowed FFT engine
///
/// Holds the planned FFT, the window coefficients and a reusable windowed
/// frame buffer. One instance per thread.
pub struct Stft {
    frames: FrameConfig,
    window_type: WindowType,
    scaling: PowerScaling,
    window: Vec<f64>,
    engine: FftEngine,
    windowed: Vec<f64>,
}

impl Stft {
    pub fn new(frames: FrameConfig, window_type: WindowType, scaling: PowerScaling) -> Result<Self> {
        frames.validate()?;

        let window = generate_window(window_type, frames.frame_size);
        check_window_energy(&frames, window_type, &window)?;
        let engine = FftEngine::new(frames.frame_size)?;

        Ok(Self {
            frames,
            window_type,
            scaling,
            window,
            engine,
            windowed: vec![0.0; frames.frame_size],
        })
    }

    pub fn frames(&self) -> FrameConfig {
        self.frames
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn scaling(&self) -> PowerScaling {
        self.scaling
    }

    /// Compute the power spectrum of every whole frame of `samples`
    ///
    /// # Errors
    /// `EmptySignal` when `samples` is shorter than one frame
    pub fn process(&mut self, samples: &[f64], sample_rate: u32) -> Result<FrameSpectra> {
        let n = self.frames.frame_size;
        if samples.len() < n {
            return Err(SpectrumError::EmptySignal {
                len: samples.len(),
                frame_size: n,
            });
        }

        let count = self.frames.frame_count(samples.len());
        let bins = self.engine.num_bins();
        let factor = self.scaling.factor(&self.window, sample_rate as f64);
        let one_sided = self.scaling.is_one_sided();

        debug!(
            "STFT: {} samples, frame_size={}, hop={}, {} frames x {} bins, window={}, scaling={}",
            samples.len(),
            n,
            self.frames.hop(),
            count,
            bins,
            self.window_type,
            self.scaling
        );

        let mut spectra = Vec::with_capacity(count);
        for index in 0..count {
            let start = self.frames.frame_start(index);
            apply_window_into(&samples[start..start + n], &self.window, &mut self.windowed);

            let mut power = vec![0.0; bins];
            self.engine.compute_power_into(&self.windowed, &mut power)?;
            scale_power(&mut power, n, factor, one_sided);
            spectra.push(power);
        }

        trace!("STFT produced {} spectra", spectra.len());

        Ok(FrameSpectra {
            frames: self.frames,
            sample_rate,
            window: self.window_type,
            scaling: self.scaling,
            spectra,
        })
    }
}
