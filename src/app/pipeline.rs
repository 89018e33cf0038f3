//! Single-spectrum analysis pipeline shared by the CLI and the map runner.
//!
//! background removal -> D / G / G′ fits -> quality -> layer classification
//!
//! `Analyzer` owns everything the pipeline needs (peak table, reference
//! classifier, solver options) and borrows the input, so one analyzer can be
//! shared read-only across worker threads.

use log::{debug, info};

use crate::classify::LayerClassifier;
use crate::domain::{FitQuality, FitResult, NormalizedSpectrum, PeakParameters, SolverOptions, Spectrum};
use crate::error::AnalysisError;
use crate::fit::{PeakTable, fit_peaks, subtract_background};
use crate::models::composite_curve;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analyzer {
    pub peaks: PeakTable,
    pub classifier: LayerClassifier,
    pub solver: SolverOptions,
}

impl Analyzer {
    pub fn new(classifier: LayerClassifier, solver: SolverOptions) -> Self {
        Self {
            peaks: PeakTable::default(),
            classifier,
            solver,
        }
    }

    /// Replace the peak guesses and bounds.
    pub fn with_peaks(mut self, peaks: PeakTable) -> Self {
        self.peaks = peaks;
        self
    }

    /// Analyze one raw spectrum.
    pub fn fit(&self, spectrum: &Spectrum) -> Result<FitResult, AnalysisError> {
        let normalized = subtract_background(spectrum)?;
        let fits = fit_peaks(&normalized, &self.peaks, &self.solver)?;
        let peaks = fits.peaks;

        let quality = quality_score(&peaks.d, &peaks.g);
        let curve = composite_curve(&normalized.shifts, &peaks);
        let goodness = goodness_of_fit(&normalized, &curve);
        let classification = self.classifier.classify(&peaks.g, &peaks.g_prime)?;

        debug!(
            "fit: {} samples, rmse {:.4}, best score {:.3}",
            goodness.n,
            goodness.rmse,
            classification.best_score()
        );
        info!(
            "classified as {} (quality {})",
            classification.label,
            quality.map_or_else(|| "n/a".to_string(), |q| format!("{q:.3}"))
        );

        Ok(FitResult {
            peaks,
            diagnostics: fits.diagnostics,
            normalized,
            curve,
            quality,
            goodness,
            classification,
        })
    }
}

/// `1 − a_D / a_G`, or `None` when the ratio is undefined.
pub fn quality_score(d: &PeakParameters, g: &PeakParameters) -> Option<f64> {
    if g.amplitude == 0.0 {
        return None;
    }
    let q = 1.0 - d.amplitude / g.amplitude;
    q.is_finite().then_some(q)
}

fn goodness_of_fit(spectrum: &NormalizedSpectrum, curve: &[f64]) -> FitQuality {
    let n = spectrum.len();
    let sse: f64 = spectrum
        .intensities
        .iter()
        .zip(curve)
        .map(|(y, f)| (y - f) * (y - f))
        .sum();
    let rmse = if n > 0 { (sse / n as f64).sqrt() } else { 0.0 };
    FitQuality { sse, rmse, n }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ReferenceTable;
    use crate::data::{SynthOptions, synthesize};
    use crate::domain::{LayerLabel, PeakKind};

    #[test]
    fn quality_is_one_minus_amplitude_ratio() {
        let d = PeakParameters::new(0.3, 20.0, 1350.0);
        let g = PeakParameters::new(1.0, 40.0, 1582.0);
        assert_eq!(quality_score(&d, &g), Some(0.7));
    }

    #[test]
    fn quality_is_undefined_without_g() {
        let d = PeakParameters::new(0.3, 20.0, 1350.0);
        let g = PeakParameters::new(0.0, 40.0, 1582.0);
        assert_eq!(quality_score(&d, &g), None);
    }

    #[test]
    fn synthetic_spectra_classify_to_their_entry() {
        let analyzer = Analyzer::default();
        for entry in ReferenceTable::default().entries() {
            let spectrum = synthesize(entry, &SynthOptions::default()).unwrap();
            let result = analyzer.fit(&spectrum).unwrap();

            assert_eq!(result.classification.label, entry.label);
            assert_eq!(result.classification.scores.len(), 6);
            assert_eq!(result.curve.len(), spectrum.len());
            assert_eq!(result.diagnostics.len(), 3);
            assert!(result.goodness.rmse < 0.1, "{:?}", result.goodness);
        }
    }

    #[test]
    fn monolayer_fit_recovers_g_and_g_prime() {
        let table = ReferenceTable::default();
        let entry = table.get(LayerLabel::Monolayer).unwrap();
        let spectrum = synthesize(entry, &SynthOptions::default()).unwrap();
        let result = Analyzer::default().fit(&spectrum).unwrap();

        let g = result.peaks.g;
        let g_prime = result.peaks.g_prime;
        assert!((g.center - entry.g.center).abs() < 1.0, "{g:?}");
        assert!((g_prime.center - entry.g_prime.center).abs() < 1.0, "{g_prime:?}");
        assert!((g.fwhm - entry.g.fwhm).abs() / entry.g.fwhm < 0.05, "{g:?}");
        assert!((g_prime.fwhm - entry.g_prime.fwhm).abs() / entry.g_prime.fwhm < 0.05, "{g_prime:?}");

        let q = result.quality.unwrap();
        assert!(q > 0.7 && q < 0.9, "{q}");
    }

    #[test]
    fn flat_spectrum_fails_in_background_stage() {
        let shifts: Vec<f64> = (0..50).map(|i| 1200.0 + 36.0 * i as f64).collect();
        let spectrum = Spectrum::new(shifts, vec![5.0; 50]).unwrap();
        let err = Analyzer::default().fit(&spectrum).unwrap_err();
        assert_eq!(err, AnalysisError::DegenerateSpectrum);
    }

    #[test]
    fn divergence_names_the_first_failing_peak() {
        let entry = *ReferenceTable::default().get(LayerLabel::Trilayer).unwrap();
        let spectrum = synthesize(&entry, &SynthOptions::default()).unwrap();
        let analyzer = Analyzer::new(
            LayerClassifier::default(),
            SolverOptions {
                max_iterations: 1,
                ..SolverOptions::default()
            },
        );
        let err = analyzer.fit(&spectrum).unwrap_err();
        assert_eq!(err.peak(), Some(PeakKind::G));
    }
}
