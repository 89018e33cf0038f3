//! Bounded Levenberg–Marquardt for three-parameter curve models.
//!
//! Given samples `(x_i, y_i)`, a model `f(x; p)` with analytic Jacobian and box
//! bounds `lower ≤ p ≤ upper`, we minimize
//!
//! ```text
//! cost(p) = ½ Σ (y_i − f(x_i; p))²
//! ```
//!
//! Each iteration solves the damped step with Marquardt scaling (`D = diag(JᵀJ)`),
//! projects the trial point back into the box and accepts it only if the cost
//! decreases. Damping shrinks after accepted steps and grows after rejected
//! ones.
//!
//! Stopping rules (MINPACK-style):
//! - relative cost reduction of an accepted step `≤ ftol`
//! - projected step length `≤ xtol · (‖p‖ + xtol)`
//!
//! Running out of iterations is reported as an error; the caller decides what
//! that means for the fit.

use nalgebra::{DMatrix, DVector};

use crate::domain::SolverOptions;
use crate::math::solve_damped_step;

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;
/// Floor for the Marquardt scaling so flat Jacobian columns stay solvable.
const DIAG_FLOOR: f64 = 1e-12;

/// A bounded three-parameter least squares problem.
pub struct BoundedProblem<'a, F, J>
where
    F: Fn(f64, &[f64; 3]) -> f64,
    J: Fn(f64, &[f64; 3], &mut [f64; 3]),
{
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub model: F,
    pub jacobian: J,
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

/// Converged solver state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmSolution {
    pub params: [f64; 3],
    pub cost: f64,
    pub iterations: usize,
}

/// Why the solver gave up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LmFailure {
    /// Iteration budget exhausted before a stopping rule was met.
    MaxIterations { iterations: usize },
    /// The model or the step produced NaN/Inf.
    NonFinite { iterations: usize },
}

impl LmFailure {
    pub fn iterations(self) -> usize {
        match self {
            LmFailure::MaxIterations { iterations } | LmFailure::NonFinite { iterations } => iterations,
        }
    }
}

impl<F, J> BoundedProblem<'_, F, J>
where
    F: Fn(f64, &[f64; 3]) -> f64,
    J: Fn(f64, &[f64; 3], &mut [f64; 3]),
{
    fn clamp(&self, p: [f64; 3]) -> [f64; 3] {
        let mut out = p;
        for j in 0..3 {
            out[j] = p[j].clamp(self.lower[j], self.upper[j]);
        }
        out
    }

    fn cost(&self, p: &[f64; 3]) -> f64 {
        0.5 * self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(&xi, &yi)| {
                let r = yi - (self.model)(xi, p);
                r * r
            })
            .sum::<f64>()
    }

    fn linearize(&self, p: &[f64; 3]) -> (DMatrix<f64>, DVector<f64>) {
        let n = self.x.len();
        let mut jac = DMatrix::<f64>::zeros(n, 3);
        let mut res = DVector::<f64>::zeros(n);
        let mut row = [0.0; 3];
        for i in 0..n {
            (self.jacobian)(self.x[i], p, &mut row);
            for j in 0..3 {
                jac[(i, j)] = row[j];
            }
            res[i] = self.y[i] - (self.model)(self.x[i], p);
        }
        (jac, res)
    }

    /// Run the solver from `initial` (clamped into the bounds first).
    pub fn solve(&self, initial: [f64; 3], opts: &SolverOptions) -> Result<LmSolution, LmFailure> {
        let mut p = self.clamp(initial);
        let mut cost = self.cost(&p);
        if !cost.is_finite() {
            return Err(LmFailure::NonFinite { iterations: 0 });
        }

        let mut lambda = LAMBDA_INIT;
        let (mut jac, mut res) = self.linearize(&p);

        for iteration in 1..=opts.max_iterations {
            if cost <= f64::MIN_POSITIVE {
                return Ok(LmSolution {
                    params: p,
                    cost,
                    iterations: iteration - 1,
                });
            }

            let diag: Vec<f64> = (0..3)
                .map(|j| jac.column(j).norm_squared().max(DIAG_FLOOR))
                .collect();

            let Some(delta) = solve_damped_step(&jac, &res, &diag, lambda) else {
                return Err(LmFailure::NonFinite { iterations: iteration });
            };

            let trial = self.clamp([p[0] + delta[0], p[1] + delta[1], p[2] + delta[2]]);
            let step_norm = (0..3).map(|j| (trial[j] - p[j]).powi(2)).sum::<f64>().sqrt();
            let p_norm = p.iter().map(|v| v * v).sum::<f64>().sqrt();

            if step_norm <= opts.xtol * (p_norm + opts.xtol) {
                return Ok(LmSolution {
                    params: p,
                    cost,
                    iterations: iteration,
                });
            }

            let trial_cost = self.cost(&trial);
            if trial_cost.is_finite() && trial_cost < cost {
                let reduction = (cost - trial_cost) / cost;
                p = trial;
                cost = trial_cost;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);

                if reduction <= opts.ftol {
                    return Ok(LmSolution {
                        params: p,
                        cost,
                        iterations: iteration,
                    });
                }
                (jac, res) = self.linearize(&p);
            } else {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    // No descent direction left at working precision.
                    return Ok(LmSolution {
                        params: p,
                        cost,
                        iterations: iteration,
                    });
                }
            }
        }

        Err(LmFailure::MaxIterations {
            iterations: opts.max_iterations,
        })
    }
}
