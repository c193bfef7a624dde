//! Dominant frequency band classification
//!
//! Bands are half-open intervals `[b[i], b[i+1])` over a caller-supplied,
//! strictly ascending list of boundaries. A bin sitting exactly on a boundary
//! belongs to the band that starts there.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectrumError};
use crate::spectrum::IntensityScale;

/// Sub-bass / bass / mids / presence / brilliance / air split up to 24 kHz
pub const DEFAULT_BAND_EDGES: [f64; 7] = [0.0, 250.0, 2000.0, 4000.0, 8000.0, 16000.0, 24000.0];

/// Validated, strictly ascending band boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct BandPartition {
    edges: Vec<f64>,
}

impl BandPartition {
    /// Validate a boundary list
    ///
    /// # Errors
    /// `InvalidBands` with fewer than two boundaries, a non-finite boundary,
    /// or boundaries that are not strictly ascending
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        let reason = if edges.len() < 2 {
            Some(format!(
                "at least 2 boundaries are required, got {}",
                edges.len()
            ))
        } else if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            Some(format!("boundary {} is not finite", bad))
        } else {
            edges.windows(2).enumerate().find(|(_, w)| w[0] >= w[1]).map(|(i, w)| {
                format!(
                    "boundaries must be strictly ascending, but bands[{}]={} >= bands[{}]={}",
                    i,
                    w[0],
                    i + 1,
                    w[1]
                )
            })
        };

        match reason {
            Some(reason) => Err(SpectrumError::InvalidBands {
                boundaries: edges,
                reason,
            }),
            None => Ok(Self { edges }),
        }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(low, high)` of band `index`
    pub fn band(&self, index: usize) -> Option<(f64, f64)> {
        if index < self.len() {
            Some((self.edges[index], self.edges[index + 1]))
        } else {
            None
        }
    }

    /// Index of the band containing `frequency`, if any
    pub fn band_of(&self, frequency: f64) -> Option<usize> {
        let (first, last) = (self.edges[0], self.edges[self.edges.len() - 1]);
        if !(frequency >= first && frequency < last) {
            return None;
        }
        // Number of edges <= frequency, minus one
        Some(self.edges.partition_point(|&e| e <= frequency) - 1)
    }
}

impl Default for BandPartition {
    fn default() -> Self {
        Self {
            edges: DEFAULT_BAND_EDGES.to_vec(),
        }
    }
}

impl TryFrom<Vec<f64>> for BandPartition {
    type Error = SpectrumError;

    fn try_from(edges: Vec<f64>) -> Result<Self> {
        Self::new(edges)
    }
}

impl From<BandPartition> for Vec<f64> {
    fn from(bands: BandPartition) -> Self {
        bands.edges
    }
}

/// Band with the most energy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantBand {
    pub index: usize,
    pub low_hz: f64,
    pub high_hz: f64,

    /// Summed linear power of the band's bins
    pub energy: f64,
}

/// Energy of every band, in band order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandEnergies {
    edges: Vec<f64>,
    energies: Vec<f64>,
}

impl BandEnergies {
    /// Band boundaries the energies were summed over
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Summed linear power per band
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// First band holding the maximum energy, `None` when there are no bands
    pub fn dominant(&self) -> Option<DominantBand> {
        let index = first_max(&self.energies)?;
        Some(DominantBand {
            index,
            low_hz: *self.edges.get(index)?,
            high_hz: *self.edges.get(index + 1)?,
            energy: self.energies[index],
        })
    }
}

/// Index of the first maximum; a later equal value never wins
fn first_max(values: &[f64]) -> Option<usize> {
    let mut best = None;
    for (i, &value) in values.iter().enumerate() {
        match best {
            Some(b) if value <= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Sum averaged intensity per band
///
/// `averaged` is in `scale`; values are converted to linear power before
/// summing. Bins outside every band are ignored.
pub fn band_energies(
    frequencies: ArrayView1<'_, f64>,
    averaged: ArrayView1<'_, f64>,
    scale: IntensityScale,
    bands: &BandPartition,
) -> BandEnergies {
    debug_assert_eq!(frequencies.len(), averaged.len());

    let mut energies = vec![0.0; bands.len()];
    for (&frequency, &level) in frequencies.iter().zip(averaged.iter()) {
        if let Some(index) = bands.band_of(frequency) {
            energies[index] += scale.to_power(level);
        }
    }

    BandEnergies {
        edges: bands.edges().to_vec(),
        energies,
    }
}

/// Classify which band carries the most averaged energy
///
/// Ties go to the lowest-frequency band.
pub fn classify(
    frequencies: ArrayView1<'_, f64>,
    averaged: ArrayView1<'_, f64>,
    scale: IntensityScale,
    bands: &BandPartition,
) -> DominantBand {
    let energies = band_energies(frequencies, averaged, scale, bands).energies;
    // A partition always has at least one band
    let index = first_max(&energies).unwrap_or(0);

    DominantBand {
        index,
        low_hz: bands.edges[index],
        high_hz: bands.edges[index + 1],
        energy: energies[index],
    }
}
