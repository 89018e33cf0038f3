//! Per-peak initial guesses and bounds.
//!
//! Each band is fit with its own regime: an initial guess and a box of allowed
//! `(a, w, b)` values. Amplitudes are expressed as multiples of the maximum
//! normalized intensity `m`, widths and centers in cm⁻¹.
//!
//! | Peak | guess (a, w, b)    | lower            | upper            |
//! |------|--------------------|------------------|------------------|
//! | G    | (1.1m, 50, 1581.6) | (0.3m, 33, 1400) | (1.5m, 60, 2000) |
//! | G′   | (1.1m, 50, 2675)   | (0.3m, 32, 2000) | (1.5m, 60, 3000) |
//! | D    | (0.1m, 15, 1350)   | (0, 10, 1300)    | (m, 50, 1400)    |

use serde::{Deserialize, Serialize};

use crate::domain::PeakKind;
use crate::error::AnalysisError;

/// Guess and bounds for one peak, with amplitudes relative to `max(I)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakRegime {
    pub kind: PeakKind,
    /// `(a/m, w, b)`
    pub guess: [f64; 3],
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

/// Concrete guess and bounds for one fit, after scaling by `max(I)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRegime {
    pub kind: PeakKind,
    pub guess: [f64; 3],
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl PeakRegime {
    /// Scale the amplitude entries by `max_intensity`.
    pub fn resolve(&self, max_intensity: f64) -> ResolvedRegime {
        let scale = |p: [f64; 3]| [p[0] * max_intensity, p[1], p[2]];
        ResolvedRegime {
            kind: self.kind,
            guess: scale(self.guess),
            lower: scale(self.lower),
            upper: scale(self.upper),
        }
    }
}

impl ResolvedRegime {
    /// Reject regimes whose bounds do not bracket the guess or allow `w ≤ 0`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        const NAMES: [&str; 3] = ["amplitude", "fwhm", "center"];
        for j in 0..3 {
            let (lo, g, hi) = (self.lower[j], self.guess[j], self.upper[j]);
            if !(lo.is_finite() && g.is_finite() && hi.is_finite()) {
                return Err(AnalysisError::InvalidBounds {
                    peak: self.kind,
                    reason: format!("non-finite {}", NAMES[j]),
                });
            }
            if !(lo <= g && g <= hi) {
                return Err(AnalysisError::InvalidBounds {
                    peak: self.kind,
                    reason: format!("{} guess {g} outside [{lo}, {hi}]", NAMES[j]),
                });
            }
        }
        if self.lower[0] < 0.0 {
            return Err(AnalysisError::InvalidBounds {
                peak: self.kind,
                reason: format!("negative amplitude bound {}", self.lower[0]),
            });
        }
        if self.lower[1] <= 0.0 {
            return Err(AnalysisError::InvalidBounds {
                peak: self.kind,
                reason: format!("fwhm lower bound {} must be > 0", self.lower[1]),
            });
        }
        Ok(())
    }
}

/// The three regimes, one per band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakTable {
    pub d: PeakRegime,
    pub g: PeakRegime,
    pub g_prime: PeakRegime,
}

impl PeakTable {
    pub fn get(&self, kind: PeakKind) -> &PeakRegime {
        match kind {
            PeakKind::D => &self.d,
            PeakKind::G => &self.g,
            PeakKind::GPrime => &self.g_prime,
        }
    }
}

impl Default for PeakTable {
    fn default() -> Self {
        Self {
            g: PeakRegime {
                kind: PeakKind::G,
                guess: [1.1, 50.0, 1581.6],
                lower: [0.3, 33.0, 1400.0],
                upper: [1.5, 60.0, 2000.0],
            },
            g_prime: PeakRegime {
                kind: PeakKind::GPrime,
                guess: [1.1, 50.0, 2675.0],
                lower: [0.3, 32.0, 2000.0],
                upper: [1.5, 60.0, 3000.0],
            },
            d: PeakRegime {
                kind: PeakKind::D,
                guess: [0.1, 15.0, 1350.0],
                lower: [0.0, 10.0, 1300.0],
                upper: [1.0, 50.0, 1400.0],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_regimes_bracket_their_guesses() {
        let table = PeakTable::default();
        for kind in PeakKind::ALL {
            table.get(kind).resolve(1.0).validate().unwrap();
            table.get(kind).resolve(0.37).validate().unwrap();
        }
    }

    #[test]
    fn amplitudes_scale_with_max_intensity() {
        let g = PeakTable::default().g.resolve(2.0);
        assert!((g.guess[0] - 2.2).abs() < 1e-12);
        assert!((g.lower[0] - 0.6).abs() < 1e-12);
        assert!((g.upper[0] - 3.0).abs() < 1e-12);
        assert_eq!(g.guess[2], 1581.6);
    }

    #[test]
    fn guess_outside_bounds_is_rejected() {
        let mut table = PeakTable::default();
        table.d.guess[2] = 1450.0;
        let err = table.d.resolve(1.0).validate().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidBounds { peak: PeakKind::D, .. }));
    }

    #[test]
    fn zero_width_bound_is_rejected() {
        let mut table = PeakTable::default();
        table.g.lower[1] = 0.0;
        let err = table.g.resolve(1.0).validate().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidBounds { peak: PeakKind::G, .. }));
    }
}
