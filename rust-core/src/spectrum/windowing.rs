//! Window functions applied to each STFT frame
//!
//! All windows are the symmetric form (denominator M-1), the same shape numpy's
//! `hanning`/`hamming`/`blackman` produce. The window changes absolute
//! intensities, so the chosen type travels with the analysis configuration.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(M-1))
    /// Sidelobe attenuation: ~31 dB, falls off quickly
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(M-1))
    /// Sidelobe attenuation: ~43 dB
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/(M-1)) + 0.08*cos(4πn/(M-1))
    /// Sidelobe attenuation: ~58 dB, wider mainlobe
    Blackman,

    /// Rectangular window (no windowing)
    Rectangular,
}

impl WindowType {
    pub const ALL: [WindowType; 4] = [
        WindowType::Hann,
        WindowType::Hamming,
        WindowType::Blackman,
        WindowType::Rectangular,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
            WindowType::Rectangular => "rectangular",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Ok(WindowType::Hann),
            "hamming" => Ok(WindowType::Hamming),
            "blackman" => Ok(WindowType::Blackman),
            "rectangular" | "rect" | "none" => Ok(WindowType::Rectangular),
            other => Err(format!(
                "unknown window `{}` (expected one of: hann, hamming, blackman, rectangular)",
                other
            )),
        }
    }
}

/// Generate window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length <= 1 {
        return vec![1.0; length];
    }

    let denom = (length - 1) as f64;

    (0..length)
        .map(|n| {
            let angle = 2.0 * PI * n as f64 / denom;
            match window_type {
                WindowType::Hann => 0.5 - 0.5 * angle.cos(),
                WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
                WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
                WindowType::Rectangular => 1.0,
            }
        })
        .collect()
}

/// Multiply `frame` by `window` sample-by-sample into `out`
///
/// All three slices must have the same length.
pub fn apply_window_into(frame: &[f64], window: &[f64], out: &mut [f64]) {
    debug_assert_eq!(frame.len(), window.len());
    debug_assert_eq!(frame.len(), out.len());

    for ((o, &s), &w) in out.iter_mut().zip(frame).zip(window) {
        *o = s * w;
    }
}

/// Sum of the window coefficients (coherent gain times length)
///
/// Used to normalize amplitude spectra so a sinusoid reads the same whatever
/// the window.
pub fn window_sum(window: &[f64]) -> f64 {
    window.iter().sum()
}

/// Sum of the squared window coefficients
///
/// Used to normalize power spectral density.
pub fn window_power_sum(window: &[f64]) -> f64 {
    window.iter().map(|&w| w * w).sum()
}
