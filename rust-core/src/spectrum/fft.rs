//! FFT engine using realfft for real-valued signals
//!
//! One engine is planned per frame size and reused across every frame of an
//! analysis; its input, output and scratch buffers are never reallocated.

use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, SpectrumError};
use crate::spectrum::windowing::{window_power_sum, window_sum};

/// How raw |X[k]|² values are normalized into power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerScaling {
    /// Plain |X[k]|², no normalization
    Raw,

    /// One-sided power spectrum: |X[k]|² / (Σw)²
    /// A sine of amplitude A reads A²/2 at its bin whatever the window or size
    #[default]
    Spectrum,

    /// One-sided power spectral density: |X[k]|² / (fs · Σw²), per Hz
    /// Same values matplotlib's `specgram` plots
    Density,
}

impl PowerScaling {
    /// Normalization factor applied to every |X[k]|²
    pub fn factor(&self, window: &[f64], sample_rate: f64) -> f64 {
        match self {
            PowerScaling::Raw => 1.0,
            PowerScaling::Spectrum => {
                let s = window_sum(window);
                1.0 / (s * s)
            }
            PowerScaling::Density => 1.0 / (sample_rate * window_power_sum(window)),
        }
    }

    /// Whether the negative-frequency half is folded into the positive bins
    pub fn is_one_sided(&self) -> bool {
        !matches!(self, PowerScaling::Raw)
    }
}

impl fmt::Display for PowerScaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerScaling::Raw => "raw",
            PowerScaling::Spectrum => "spectrum",
            PowerScaling::Density => "density",
        })
    }
}

impl FromStr for PowerScaling {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(PowerScaling::Raw),
            "spectrum" => Ok(PowerScaling::Spectrum),
            "density" | "psd" => Ok(PowerScaling::Density),
            other => Err(format!(
                "unknown scaling `{}` (expected one of: raw, spectrum, density)",
                other
            )),
        }
    }
}

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer (the transform overwrites it)
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex<f64>>,

    scratch: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples), must be non-zero
    pub fn new(fft_size: usize) -> Result<Self> {
        if fft_size == 0 {
            return Err(SpectrumError::InvalidFrameConfig {
                frame_size: fft_size,
                overlap: 0,
                reason: "frame_size must be positive",
            });
        }

        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();
        let scratch = r2c.make_scratch_vec();

        Ok(Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
            scratch,
        })
    }

    /// Compute the power spectrum |X[k]|² of one frame into `out`
    ///
    /// # Arguments
    /// * `frame` - Exactly `fft_size` windowed samples
    /// * `out` - Destination with `num_bins()` entries
    pub fn compute_power_into(&mut self, frame: &[f64], out: &mut [f64]) -> Result<()> {
        if frame.len() != self.fft_size {
            return Err(SpectrumError::Fft(format!(
                "frame has {} samples, engine expects {}",
                frame.len(),
                self.fft_size
            )));
        }
        self.input_buffer.copy_from_slice(frame);

        self.r2c
            .process_with_scratch(
                &mut self.input_buffer,
                &mut self.output_buffer,
                &mut self.scratch,
            )
            .map_err(|e| SpectrumError::Fft(e.to_string()))?;

        for (o, c) in out.iter_mut().zip(self.output_buffer.iter()) {
            *o = c.norm_sqr();
        }

        Ok(())
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}

/// Normalize a raw |X[k]|² spectrum in place
///
/// Multiplies by `factor`, then for one-sided scalings doubles every bin that
/// has a negative-frequency twin (all but DC and, for even sizes, Nyquist).
pub fn scale_power(power: &mut [f64], fft_size: usize, factor: f64, one_sided: bool) {
    let last = power.len().saturating_sub(1);
    let has_nyquist = fft_size % 2 == 0;

    for (k, p) in power.iter_mut().enumerate() {
        *p *= factor;
        if one_sided && k != 0 && !(has_nyquist && k == last) {
            *p *= 2.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::windowing::{generate_window, WindowType};
    use std::f64::consts::PI;

    fn power_of(fft: &mut FftEngine, frame: &[f64]) -> Vec<f64> {
        let mut power = vec![0.0; fft.num_bins()];
        fft.compute_power_into(frame, &mut power).unwrap();
        power
    }

    #[test]
    fn test_fft_dc_signal() {
        let mut fft = FftEngine::new(1024).unwrap();

        // DC bin (k=0) holds the squared sum of the samples
        let power = power_of(&mut fft, &vec![1.0; 1024]);
        assert!((power[0] - 1024.0 * 1024.0).abs() < 1e-6);
        assert!(power[1..].iter().all(|&p| p < 1e-12));
    }

    #[test]
    fn test_fft_sine_wave() {
        let mut fft = FftEngine::new(1024).unwrap();

        // Exactly on bin 64
        let signal: Vec<f64> = (0..1024)
            .map(|n| (2.0 * PI * 64.0 * n as f64 / 1024.0).sin())
            .collect();

        let power = power_of(&mut fft, &signal);

        let (peak_bin, &peak) = power
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        assert_eq!(peak_bin, 64);

        // Peak magnitude is N/2 for a unit sine on a bin center
        assert!((peak.sqrt() - 512.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_length_must_match() {
        let mut fft = FftEngine::new(1024).unwrap();
        let mut out = vec![0.0; fft.num_bins()];

        for len in [100, 1023, 1025] {
            assert!(matches!(
                fft.compute_power_into(&vec![1.0; len], &mut out),
                Err(SpectrumError::Fft(_))
            ));
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            FftEngine::new(0),
            Err(SpectrumError::InvalidFrameConfig { frame_size: 0, .. })
        ));
    }

    #[test]
    fn test_parse_scaling_names() {
        assert_eq!("raw".parse::<PowerScaling>(), Ok(PowerScaling::Raw));
        assert_eq!("Spectrum".parse::<PowerScaling>(), Ok(PowerScaling::Spectrum));
        assert_eq!("psd".parse::<PowerScaling>(), Ok(PowerScaling::Density));
        assert!("magnitude".parse::<PowerScaling>().is_err());

        for scaling in [PowerScaling::Raw, PowerScaling::Spectrum, PowerScaling::Density] {
            assert_eq!(scaling.to_string().parse::<PowerScaling>(), Ok(scaling));
        }
    }

    #[test]
    fn test_spectrum_scaling_reads_sine_power() {
        let n = 1024;
        let mut fft = FftEngine::new(n).unwrap();
        let window = generate_window(WindowType::Hann, n);

        let amplitude = 0.5;
        let signal: Vec<f64> = (0..n)
            .map(|i| amplitude * (2.0 * PI * 100.0 * i as f64 / n as f64).sin() * window[i])
            .collect();

        let mut power = power_of(&mut fft, &signal);
        let factor = PowerScaling::Spectrum.factor(&window, 48000.0);
        scale_power(&mut power, n, factor, true);

        // A²/2 within the window's scalloping of a bin-centered tone
        let expected = amplitude * amplitude / 2.0;
        assert!((power[100] - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_scale_power_keeps_dc_and_nyquist() {
        let mut power = vec![1.0; 5];
        scale_power(&mut power, 8, 0.5, true);
        assert_eq!(power, vec![0.5, 1.0, 1.0, 1.0, 0.5]);

        // Odd size has no Nyquist bin
        let mut power = vec![1.0; 4];
        scale_power(&mut power, 7, 1.0, true);
        assert_eq!(power, vec![1.0, 2.0, 2.0, 2.0]);

        let mut power = vec![1.0; 4];
        scale_power(&mut power, 7, 1.0, false);
        assert_eq!(power, vec![1.0; 4]);
    }
}
