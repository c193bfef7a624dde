//! Python bindings for spectral analysis

use numpy::{PyArray1, PyArray2, PyReadonlyArray1, ToPyArray};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

use crate::analysis::AnalysisReport;
use crate::audio::{decode_file, Waveform};
use crate::config::AnalysisConfig;
use crate::error::SpectrumError;
use crate::spectrum::{PowerScaling, WindowType};

fn value_error(err: SpectrumError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::Rectangular => WindowType::Rectangular,
        }
    }
}

/// Result of one analysis exposed to Python
#[pyclass(name = "Analysis")]
pub struct PyAnalysis {
    report: AnalysisReport,
}

#[pymethods]
impl PyAnalysis {
    /// Frequency of each bin in Hz
    #[getter]
    fn frequencies<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        self.report.spectrogram.frequencies().to_pyarray(py)
    }

    /// Center time of each frame in seconds
    #[getter]
    fn times<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        self.report.spectrogram.times().to_pyarray(py)
    }

    /// Intensity matrix, shape (bins, frames)
    #[getter]
    fn intensity<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
        self.report.spectrogram.intensity().to_pyarray(py)
    }

    /// Time-averaged intensity per bin
    #[getter]
    fn average_intensity<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        self.report.average_intensity.to_pyarray(py)
    }

    /// Cutoff frequency in Hz (0.0 when nothing exceeds the threshold)
    #[getter]
    fn cutoff_hz(&self) -> f64 {
        self.report.cutoff.hz()
    }

    /// (low, high, energy) of the dominant band, or None
    #[getter]
    fn dominant_band(&self) -> Option<(f64, f64, f64)> {
        self.report
            .dominant_band
            .map(|b| (b.low_hz, b.high_hz, b.energy))
    }

    /// Whether intensities are in dB (True) or linear power (False)
    #[getter]
    fn decibels(&self) -> bool {
        matches!(
            self.report.spectrogram.scale(),
            crate::spectrum::IntensityScale::Decibels { .. }
        )
    }

    fn __repr__(&self) -> String {
        format!(
            "Analysis(bins={}, frames={}, cutoff_hz={:.1})",
            self.report.spectrogram.num_bins(),
            self.report.spectrogram.num_frames(),
            self.report.cutoff.hz()
        )
    }
}

/// Analyze interleaved samples
///
/// Args:
///     samples: Interleaved samples as numpy array
///     sample_rate: Sample rate in Hz
///     channels: Number of interleaved channels (downmixed to mono)
///     frame_size: STFT frame size
///     overlap: Samples shared by consecutive frames
///     window_type: Window applied to each frame
///     threshold_db: Cutoff threshold in dB
///     decibels: Store intensities in dB (True) or power (False)
///     floor_db: Lowest stored dB value
///     scaling: "raw", "spectrum" or "density" (matplotlib specgram)
///     bands: Ascending band boundaries in Hz, or None to skip classification
///
/// Returns:
///     Analysis result
#[pyfunction]
#[pyo3(signature = (
    samples,
    sample_rate,
    channels=1,
    frame_size=2048,
    overlap=1024,
    window_type=PyWindowType::Hann,
    threshold_db=-60.0,
    decibels=true,
    floor_db=-120.0,
    scaling="spectrum",
    bands=None
))]
#[allow(clippy::too_many_arguments)]
pub fn analyze(
    samples: PyReadonlyArray1<f64>,
    sample_rate: u32,
    channels: usize,
    frame_size: usize,
    overlap: usize,
    window_type: PyWindowType,
    threshold_db: f64,
    decibels: bool,
    floor_db: f64,
    scaling: &str,
    bands: Option<Vec<f64>>,
) -> PyResult<PyAnalysis> {
    let scaling: PowerScaling = scaling.parse().map_err(PyValueError::new_err)?;
    let waveform = Waveform::from_interleaved(samples.as_array().to_vec(), channels, sample_rate)
        .map_err(value_error)?;

    let config = AnalysisConfig {
        frame_size,
        overlap,
        window: window_type.into(),
        scaling,
        decibels,
        floor_db,
        threshold_db,
        bands: bands.unwrap_or_default(),
    };

    let report = crate::analysis::analyze(&waveform, &config).map_err(value_error)?;
    Ok(PyAnalysis { report })
}

/// Decode an audio file
///
/// Returns:
///     (interleaved samples, sample_rate, channels)
#[pyfunction]
pub fn decode<'py>(py: Python<'py>, path: PathBuf) -> PyResult<(&'py PyArray1<f64>, u32, usize)> {
    let waveform = decode_file(&path).map_err(|e| PyIOError::new_err(e.to_string()))?;
    Ok((
        PyArray1::from_slice(py, waveform.samples()),
        waveform.sample_rate(),
        waveform.channels(),
    ))
}
