//! Independent single-peak fits for D, G and G′.
//!
//! Each band is fit against the *whole* normalized spectrum, not a window
//! around its expected position: the other bands are simply part of that fit's
//! residual. The three fits share nothing but the (read-only) input, and a
//! fit that fails to converge is reported as-is, never retried.

use log::debug;

use crate::domain::{NormalizedSpectrum, PeakDiagnostics, PeakKind, PeakParameters, PeakSet, SolverOptions};
use crate::error::AnalysisError;
use crate::fit::peaks::{PeakTable, ResolvedRegime};
use crate::math::{BoundedProblem, LmFailure};
use crate::models::{fill_jacobian_row, lorentzian};

/// Best fit for a single peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakFit {
    pub params: PeakParameters,
    pub diagnostics: PeakDiagnostics,
}

/// Fits for all three peaks.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakFits {
    pub peaks: PeakSet,
    pub diagnostics: Vec<PeakDiagnostics>,
}

/// Fit one Lorentzian under `regime` against the full spectrum.
pub fn fit_peak(
    spectrum: &NormalizedSpectrum,
    regime: &ResolvedRegime,
    opts: &SolverOptions,
) -> Result<PeakFit, AnalysisError> {
    regime.validate()?;
    fit_validated(spectrum, regime, opts)
}

/// `regime` must already have passed `ResolvedRegime::validate`.
fn fit_validated(
    spectrum: &NormalizedSpectrum,
    regime: &ResolvedRegime,
    opts: &SolverOptions,
) -> Result<PeakFit, AnalysisError> {
    let problem = BoundedProblem {
        x: &spectrum.shifts,
        y: &spectrum.intensities,
        model: |omega, p: &[f64; 3]| lorentzian(omega, p[0], p[1], p[2]),
        jacobian: |omega, p: &[f64; 3], out: &mut [f64; 3]| fill_jacobian_row(omega, p, out),
        lower: regime.lower,
        upper: regime.upper,
    };

    let solution = problem.solve(regime.guess, opts).map_err(|failure| {
        if let LmFailure::NonFinite { .. } = failure {
            debug!("peak {}: non-finite values during fit", regime.kind);
        }
        AnalysisError::FitDivergence {
            peak: regime.kind,
            iterations: failure.iterations(),
        }
    })?;

    debug!(
        "peak {}: a={:.4} w={:.2} b={:.2} after {} iterations (cost {:.3e})",
        regime.kind,
        solution.params[0],
        solution.params[1],
        solution.params[2],
        solution.iterations,
        solution.cost
    );

    Ok(PeakFit {
        params: PeakParameters::from_array(solution.params),
        diagnostics: PeakDiagnostics {
            peak: regime.kind,
            iterations: solution.iterations,
            cost: solution.cost,
        },
    })
}

/// Fit D, G and G′ independently.
///
/// All regimes are validated before the first fit starts, so a bad table never
/// produces partial work.
pub fn fit_peaks(
    spectrum: &NormalizedSpectrum,
    table: &PeakTable,
    opts: &SolverOptions,
) -> Result<PeakFits, AnalysisError> {
    let max_intensity = spectrum.max_intensity();
    let regimes: Vec<ResolvedRegime> = [PeakKind::G, PeakKind::GPrime, PeakKind::D]
        .iter()
        .map(|&kind| table.get(kind).resolve(max_intensity))
        .collect();
    for regime in &regimes {
        regime.validate()?;
    }

    let g = fit_validated(spectrum, &regimes[0], opts)?;
    let g_prime = fit_validated(spectrum, &regimes[1], opts)?;
    let d = fit_validated(spectrum, &regimes[2], opts)?;

    Ok(PeakFits {
        peaks: PeakSet {
            d: d.params,
            g: g.params,
            g_prime: g_prime.params,
        },
        diagnostics: vec![d.diagnostics, g.diagnostics, g_prime.diagnostics],
    })
}
