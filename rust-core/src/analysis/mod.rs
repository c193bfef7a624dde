//! End-to-end analysis of one waveform
//!
//! downmix → windowed STFT → spectrogram → {cutoff, dominant band}

pub mod bands;
pub mod cutoff;

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub use bands::{band_energies, classify, BandEnergies, BandPartition, DominantBand};
pub use cutoff::{estimate_cutoff, find_cutoff, Cutoff, Threshold};

use crate::audio::Waveform;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::spectrum::{Spectrogram, Stft};

/// Everything one analysis produces
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub spectrogram: Spectrogram,

    /// Time-averaged intensity per frequency bin, in the spectrogram's scale
    pub average_intensity: Array1<f64>,

    pub cutoff: Cutoff,

    /// Per-band energies, `None` when no bands were configured
    pub band_energies: Option<BandEnergies>,

    pub dominant_band: Option<DominantBand>,

    pub channels: usize,
}

/// Scalar results of an analysis, for printing or serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: f64,
    pub frames: usize,
    pub bins: usize,
    pub bin_width_hz: f64,
    pub cutoff_hz: f64,
    pub cutoff: Cutoff,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_band: Option<DominantBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_energies: Option<BandEnergies>,
}

impl AnalysisReport {
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            sample_rate: self.spectrogram.sample_rate(),
            channels: self.channels,
            duration_secs: self.spectrogram.duration(),
            frames: self.spectrogram.num_frames(),
            bins: self.spectrogram.num_bins(),
            bin_width_hz: self.spectrogram.bin_width_hz(),
            cutoff_hz: self.cutoff.hz(),
            cutoff: self.cutoff,
            dominant_band: self.dominant_band,
            band_energies: self.band_energies.clone(),
        }
    }
}

/// Reusable analysis pipeline
///
/// Holds the planned FFT and window for one configuration. Instances carry no
/// state between calls beyond scratch buffers; use one per thread.
pub struct Analyzer {
    config: AnalysisConfig,
    bands: Option<BandPartition>,
    stft: Stft,
}

impl Analyzer {
    /// Create an analyzer, validating `config`
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let bands = config.band_partition()?;
        let stft = Stft::new(config.frames(), config.window, config.scaling)?;

        Ok(Self {
            config,
            bands,
            stft,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the full pipeline on `waveform`
    pub fn analyze(&mut self, waveform: &Waveform) -> Result<AnalysisReport> {
        let mono = waveform.to_mono();
        let spectrogram = self.spectrogram(&mono, waveform.sample_rate())?;

        let average_intensity = spectrogram.average_intensity();
        let cutoff = find_cutoff(
            spectrogram.frequencies(),
            average_intensity.view(),
            self.config.threshold().checked_value(spectrogram.scale())?,
        );

        let energies = self.bands.as_ref().map(|bands| {
            band_energies(
                spectrogram.frequencies(),
                average_intensity.view(),
                spectrogram.scale(),
                bands,
            )
        });
        let dominant_band = energies.as_ref().and_then(BandEnergies::dominant);

        debug!(
            "Analysis: {} ch @ {} Hz, cutoff={:.1} Hz, dominant band={:?}",
            waveform.channels(),
            waveform.sample_rate(),
            cutoff.hz(),
            dominant_band.map(|b| (b.low_hz, b.high_hz))
        );

        Ok(AnalysisReport {
            spectrogram,
            average_intensity,
            cutoff,
            band_energies: energies,
            dominant_band,
            channels: waveform.channels(),
        })
    }

    /// Windowed STFT plus assembly, for a mono buffer
    pub fn spectrogram(&mut self, mono: &[f64], sample_rate: u32) -> Result<Spectrogram> {
        let spectra = self.stft.process(mono, sample_rate)?;
        Spectrogram::assemble(&spectra, self.config.scale())
    }
}

/// Analyze one waveform with `config`
pub fn analyze(waveform: &Waveform, config: &AnalysisConfig) -> Result<AnalysisReport> {
    Analyzer::new(config.clone())?.analyze(waveform)
}
