//! Background subtraction and intensity normalization.
//!
//! The slowly varying substrate/fluorescence background is approximated by the
//! quadratic passing through three samples of the raw spectrum: the first, the
//! middle (`⌊N/2⌋`) and the last. After removing it, any residual linear tilt
//! between the first and last samples is removed, and the result is min-max
//! rescaled to `[0, 1]`.

use crate::domain::{NormalizedSpectrum, Spectrum};
use crate::error::AnalysisError;

/// A corrected spectrum whose range is below this fraction of the raw
/// intensity scale is treated as flat.
const FLAT_TOLERANCE: f64 = 1e-9;

/// Remove the background from `spectrum` and rescale it to `[0, 1]`.
pub fn subtract_background(spectrum: &Spectrum) -> Result<NormalizedSpectrum, AnalysisError> {
    let n = spectrum.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData { len: n });
    }

    let x = spectrum.shifts();
    let y = spectrum.intensities();
    let mid = n / 2;

    // 1) Quadratic through first / middle / last samples.
    let knots = [(x[0], y[0]), (x[mid], y[mid]), (x[n - 1], y[n - 1])];
    let mut corrected: Vec<f64> = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| yi - quadratic_through(&knots, xi))
        .collect();

    // 2) Residual tilt between the corrected end points.
    let slope = (corrected[n - 1] - corrected[0]) / (x[n - 1] - x[0]);
    let intercept = corrected[0] - slope * x[0];
    for (value, &xi) in corrected.iter_mut().zip(x.iter()) {
        *value -= slope * xi + intercept;
    }

    // 3) Min-max rescale.
    let min = corrected.iter().copied().fold(f64::INFINITY, f64::min);
    let max = corrected.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let scale = y.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let range = max - min;
    if !(range > FLAT_TOLERANCE * scale) {
        return Err(AnalysisError::DegenerateSpectrum);
    }

    let intensities = corrected.iter().map(|v| (v - min) / range).collect();
    Ok(NormalizedSpectrum {
        shifts: x.to_vec(),
        intensities,
    })
}

/// Evaluate the quadratic through three points with distinct x (Lagrange form).
fn quadratic_through(knots: &[(f64, f64); 3], x: f64) -> f64 {
    let [(x0, y0), (x1, y1), (x2, y2)] = *knots;
    let l0 = (x - x1) * (x - x2) / ((x0 - x1) * (x0 - x2));
    let l1 = (x - x0) * (x - x2) / ((x1 - x0) * (x1 - x2));
    let l2 = (x - x0) * (x - x1) / ((x2 - x0) * (x2 - x1));
    y0 * l0 + y1 * l1 + y2 * l2
}
