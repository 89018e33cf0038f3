//! Synthetic Raman spectra built from reference entries.
//!
//! A synthetic spectrum is the sum of the entry's G and G′ Lorentzians, a D
//! band, a quadratic background and optional Gaussian noise, sampled on a
//! uniform shift axis and scaled to detector-like counts. Generation is seeded
//! so the same options always reproduce the same spectrum.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::classify::ReferenceEntry;
use crate::domain::{PeakParameters, Spectrum};
use crate::error::AppError;
use crate::models::lorentzian;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthOptions {
    /// First shift on the axis (cm⁻¹).
    pub start: f64,
    /// Last shift on the axis (cm⁻¹).
    pub end: f64,
    pub points: usize,
    /// D band in normalized units.
    pub d: PeakParameters,
    /// Background `c0 + c1·t + c2·t²` with `t ∈ [0, 1]` along the axis, normalized units.
    pub background: [f64; 3],
    /// Multiplier from normalized units to counts.
    pub scale: f64,
    /// Noise standard deviation in normalized units (0 = noiseless).
    pub noise: f64,
    pub seed: u64,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            start: 1200.0,
            end: 3000.0,
            points: 1001,
            d: PeakParameters::new(0.08, 20.0, 1350.0),
            background: [0.2, 0.15, 0.1],
            scale: 1000.0,
            noise: 0.0,
            seed: 42,
        }
    }
}

/// Build a raw spectrum that should classify as `entry.label`.
pub fn synthesize(entry: &ReferenceEntry, opts: &SynthOptions) -> Result<Spectrum, AppError> {
    if opts.points < 3 {
        return Err(AppError::new(2, "Synthetic spectrum needs at least 3 points."));
    }
    if !(opts.start.is_finite() && opts.end.is_finite() && opts.end > opts.start) {
        return Err(AppError::new(2, "Invalid shift range for synthetic spectrum."));
    }
    if !(opts.scale.is_finite() && opts.scale > 0.0) {
        return Err(AppError::new(2, "Synthetic intensity scale must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let normal = Normal::new(0.0, opts.noise)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let span = opts.end - opts.start;
    let step = span / (opts.points - 1) as f64;
    let [c0, c1, c2] = opts.background;

    let mut shifts = Vec::with_capacity(opts.points);
    let mut intensities = Vec::with_capacity(opts.points);
    for i in 0..opts.points {
        let omega = opts.start + step * i as f64;
        let t = (omega - opts.start) / span;

        let peaks: f64 = [opts.d, entry.g, entry.g_prime]
            .iter()
            .map(|p| lorentzian(omega, p.amplitude, p.fwhm, p.center))
            .sum();
        let noise = if opts.noise > 0.0 { normal.sample(&mut rng) } else { 0.0 };

        shifts.push(omega);
        intensities.push(opts.scale * (peaks + c0 + c1 * t + c2 * t * t + noise));
    }

    Ok(Spectrum::new(shifts, intensities)?)
}
