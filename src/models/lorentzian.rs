//! Lorentzian lineshape.
//!
//! ```text
//! L(ω; a, w, b) = a · (w/2)² / ((ω − b)² + (w/2)²)
//! ```
//!
//! `a` is the peak height, `w` the full width at half maximum and `b` the
//! center. The fitter relies on two primitive operations:
//! - evaluate `L` over a shift axis (for residuals, curves and exports)
//! - fill a Jacobian row `[∂L/∂a, ∂L/∂w, ∂L/∂b]` at a single ω (for the solver)

use crate::domain::{PeakParameters, PeakSet};

/// Evaluate a single Lorentzian at `omega`.
pub fn lorentzian(omega: f64, amplitude: f64, fwhm: f64, center: f64) -> f64 {
    let h2 = 0.25 * fwhm * fwhm;
    let d = omega - center;
    amplitude * h2 / (d * d + h2)
}

/// Evaluate a Lorentzian over every point of `shifts`.
pub fn lorentzian_curve(shifts: &[f64], peak: &PeakParameters) -> Vec<f64> {
    shifts
        .iter()
        .map(|&omega| lorentzian(omega, peak.amplitude, peak.fwhm, peak.center))
        .collect()
}

/// Fill the Jacobian row of `L` with respect to `[a, w, b]` at `omega`.
pub fn fill_jacobian_row(omega: f64, params: &[f64; 3], out: &mut [f64; 3]) {
    let [a, w, b] = *params;
    let h = 0.5 * w;
    let h2 = h * h;
    let d = omega - b;
    let denom = d * d + h2;
    let denom2 = denom * denom;

    out[0] = h2 / denom;
    // dL/dw = dL/dh · ½ with dL/dh = 2 a h d² / denom²
    out[1] = a * h * d * d / denom2;
    out[2] = 2.0 * a * h2 * d / denom2;
}

/// Composite `D + G + G′` curve.
pub fn composite_curve(shifts: &[f64], peaks: &PeakSet) -> Vec<f64> {
    shifts
        .iter()
        .map(|&omega| {
            [peaks.d, peaks.g, peaks.g_prime]
                .iter()
                .map(|p| lorentzian(omega, p.amplitude, p.fwhm, p.center))
                .sum()
        })
        .collect()
}
