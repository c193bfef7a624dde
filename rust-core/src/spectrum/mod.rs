//! Spectral analysis with FFT

pub mod fft;
pub mod spectrogram;
pub mod stft;
pub mod windowing;

pub use fft::{FftEngine, PowerScaling};
pub use spectrogram::{db_to_power, power_to_db, IntensityScale, IntensityUnit, Spectrogram, DEFAULT_FLOOR_DB};
pub use stft::{FrameConfig, FrameSpectra, Stft};
pub use windowing::{generate_window, WindowType};
