//! Spek - Spectral Bandwidth Analysis Core
//!
//! Computes a spectrogram of a decoded waveform, estimates its effective
//! bandwidth (cutoff frequency) and reports which frequency band carries the
//! most energy. A hard cutoff well below Nyquist is the usual fingerprint of
//! a file transcoded from a lossy source.
//!
//! ```no_run
//! use spek::{analyze, AnalysisConfig};
//!
//! let wave = spek::audio::decode_file("track.flac".as_ref())?;
//! let report = analyze(&wave, &AnalysisConfig::default())?;
//! println!("cutoff: {:.0} Hz", report.cutoff.hz());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use analysis::{analyze, AnalysisReport, AnalysisSummary, Analyzer, BandPartition, Cutoff, DominantBand, Threshold};
pub use audio::Waveform;
pub use config::AnalysisConfig;
pub use error::SpectrumError;
pub use spectrum::{IntensityScale, PowerScaling, Spectrogram, WindowType};
