//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for reporting or comparisons

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One of the three Raman bands fitted for every spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakKind {
    D,
    G,
    GPrime,
}

impl PeakKind {
    pub const ALL: [PeakKind; 3] = [PeakKind::D, PeakKind::G, PeakKind::GPrime];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            PeakKind::D => "D",
            PeakKind::G => "G",
            PeakKind::GPrime => "G′",
        }
    }
}

impl std::fmt::Display for PeakKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Layer-count classification labels.
///
/// The declaration order is the fixed enumeration order used to break ties
/// between equally scored candidates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum LayerLabel {
    Monolayer,
    Bilayer,
    Trilayer,
    FourLayers,
    FiveLayers,
    Graphene,
}

impl LayerLabel {
    pub const ALL: [LayerLabel; 6] = [
        LayerLabel::Monolayer,
        LayerLabel::Bilayer,
        LayerLabel::Trilayer,
        LayerLabel::FourLayers,
        LayerLabel::FiveLayers,
        LayerLabel::Graphene,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            LayerLabel::Monolayer => "monolayer",
            LayerLabel::Bilayer => "bilayer",
            LayerLabel::Trilayer => "trilayer",
            LayerLabel::FourLayers => "four layers",
            LayerLabel::FiveLayers => "five layers",
            LayerLabel::Graphene => "graphene",
        }
    }
}

impl std::fmt::Display for LayerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A raw Raman spectrum: intensities sampled on a strictly increasing
/// Raman-shift axis (cm⁻¹).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    shifts: Vec<f64>,
    intensities: Vec<f64>,
}

impl Spectrum {
    /// Build a spectrum, applying the shape check (equal lengths, finite
    /// values, strictly increasing shifts).
    pub fn new(shifts: Vec<f64>, intensities: Vec<f64>) -> Result<Self, AnalysisError> {
        if shifts.len() != intensities.len() {
            return Err(AnalysisError::MalformedSpectrum {
                reason: format!(
                    "{} shift values but {} intensity values",
                    shifts.len(),
                    intensities.len()
                ),
            });
        }
        if let Some(i) = shifts.iter().chain(intensities.iter()).position(|v| !v.is_finite()) {
            return Err(AnalysisError::MalformedSpectrum {
                reason: format!("non-finite value at index {}", i % shifts.len().max(1)),
            });
        }
        if let Some(i) = shifts.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AnalysisError::MalformedSpectrum {
                reason: format!("Raman shift is not strictly increasing at index {}", i + 1),
            });
        }
        Ok(Self { shifts, intensities })
    }

    /// Build a spectrum from `(shift, intensity)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, AnalysisError> {
        let (shifts, intensities) = pairs.iter().copied().unzip();
        Self::new(shifts, intensities)
    }

    pub fn shifts(&self) -> &[f64] {
        &self.shifts
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }
}

/// Background-subtracted spectrum rescaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSpectrum {
    pub shifts: Vec<f64>,
    pub intensities: Vec<f64>,
}

impl NormalizedSpectrum {
    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Maximum intensity (1.0 for anything produced by background subtraction).
    pub fn max_intensity(&self) -> f64 {
        self.intensities.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// View the normalized data as a raw spectrum (e.g. to re-run the pipeline on it).
    pub fn to_spectrum(&self) -> Result<Spectrum, AnalysisError> {
        Spectrum::new(self.shifts.clone(), self.intensities.clone())
    }
}

/// Lorentzian peak parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakParameters {
    /// Peak height.
    pub amplitude: f64,
    /// Full width at half maximum (cm⁻¹).
    pub fwhm: f64,
    /// Peak position (cm⁻¹).
    pub center: f64,
}

impl PeakParameters {
    pub const fn new(amplitude: f64, fwhm: f64, center: f64) -> Self {
        Self {
            amplitude,
            fwhm,
            center,
        }
    }

    /// Parameters in solver order `[a, w, b]`.
    pub fn to_array(self) -> [f64; 3] {
        [self.amplitude, self.fwhm, self.center]
    }

    pub fn from_array(p: [f64; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

/// Fitted parameters for all three bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSet {
    pub d: PeakParameters,
    pub g: PeakParameters,
    pub g_prime: PeakParameters,
}

impl PeakSet {
    pub fn get(&self, kind: PeakKind) -> &PeakParameters {
        match kind {
            PeakKind::D => &self.d,
            PeakKind::G => &self.g,
            PeakKind::GPrime => &self.g_prime,
        }
    }
}

/// Solver diagnostics for a single peak fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakDiagnostics {
    pub peak: PeakKind,
    pub iterations: usize,
    /// Final `½ Σ r²` of the single-peak fit against the full spectrum.
    pub cost: f64,
}

/// Goodness of the composite three-peak curve against the normalized spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
}

/// Deviation score of one reference candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub label: LayerLabel,
    pub score: f64,
}

/// Scores for every reference candidate plus the selected (lowest) label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub scores: Vec<CandidateScore>,
    pub label: LayerLabel,
}

impl ClassificationResult {
    pub fn score_for(&self, label: LayerLabel) -> Option<f64> {
        self.scores.iter().find(|c| c.label == label).map(|c| c.score)
    }

    /// Score of the selected label.
    pub fn best_score(&self) -> f64 {
        self.score_for(self.label).unwrap_or(f64::NAN)
    }
}

/// Full analysis output for one spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub peaks: PeakSet,
    pub diagnostics: Vec<PeakDiagnostics>,
    pub normalized: NormalizedSpectrum,
    /// Composite `D + G + G′` curve evaluated on `normalized.shifts`.
    pub curve: Vec<f64>,
    /// `1 − a_D / a_G`; `None` when `a_G` is zero.
    pub quality: Option<f64>,
    pub goodness: FitQuality,
    pub classification: ClassificationResult,
}

/// A map position in stage coordinates (µm).
///
/// Ordered with `f64::total_cmp` (x first, then y) so positions can key a `BTreeMap`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A 2-D Raman map: one intensity sequence per position, all sharing one shift axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialMap {
    pub shifts: Vec<f64>,
    pub points: BTreeMap<Position, Vec<f64>>,
}

impl SpatialMap {
    pub fn new(shifts: Vec<f64>) -> Self {
        Self {
            shifts,
            points: BTreeMap::new(),
        }
    }

    /// Insert (or replace) the intensities recorded at `position`.
    pub fn insert(&mut self, position: Position, intensities: Vec<f64>) {
        self.points.insert(position, intensities);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Spectrum at `position`, validated against the shared axis.
    pub fn spectrum_at(&self, position: &Position) -> Option<Result<Spectrum, AnalysisError>> {
        self.points
            .get(position)
            .map(|intensities| Spectrum::new(self.shifts.clone(), intensities.clone()))
    }
}

/// Levenberg–Marquardt stopping rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Iteration budget per peak fit; exceeding it is a divergence.
    pub max_iterations: usize,
    /// Relative cost-reduction tolerance.
    pub ftol: f64,
    /// Relative step-size tolerance.
    pub xtol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
        }
    }
}

/// A full run’s configuration as understood by the pipeline.
///
/// This is derived from CLI flags, falling back to environment defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    /// Reference table JSON; the built-in table is used when absent.
    pub reference: Option<PathBuf>,
    pub solver: SolverOptions,
    /// Worker count for map analysis (`None` = available parallelism).
    pub threads: Option<usize>,
    /// Per-position CSV export (map runs).
    pub export_csv: Option<PathBuf>,
    /// Fit result JSON export (single-spectrum runs).
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_rejects_non_increasing_axis() {
        let err = Spectrum::new(vec![1.0, 2.0, 2.0], vec![0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedSpectrum { .. }));
    }

    #[test]
    fn spectrum_rejects_length_mismatch() {
        let err = Spectrum::new(vec![1.0, 2.0, 3.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedSpectrum { .. }));
    }

    #[test]
    fn positions_order_by_x_then_y() {
        let mut positions = vec![
            Position::new(1.0, 0.0),
            Position::new(0.0, 5.0),
            Position::new(0.0, -1.0),
        ];
        positions.sort();
        assert_eq!(positions[0], Position::new(0.0, -1.0));
        assert_eq!(positions[1], Position::new(0.0, 5.0));
        assert_eq!(positions[2], Position::new(1.0, 0.0));
    }

    #[test]
    fn layer_labels_keep_enumeration_order() {
        let mut labels = LayerLabel::ALL.to_vec();
        labels.reverse();
        labels.sort();
        assert_eq!(labels, LayerLabel::ALL.to_vec());
        assert_eq!(LayerLabel::FourLayers.to_string(), "four layers");
    }
}
