//! Linear least squares solver.
//!
//! Every Levenberg–Marquardt iteration solves a small damped linear problem:
//!
//! ```text
//! minimize ‖J δ − r‖² + λ ‖D^{1/2} δ‖²
//! ```
//!
//! which is the ordinary least squares problem of the augmented system
//! `[J; sqrt(λ D)] δ = [r; 0]`.
//!
//! Implementation choices:
//! - We solve with SVD so tall systems (more rows than columns) work directly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is tiny (3 columns), so SVD cost is dominated by
//!   the number of spectrum samples.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the damped step `[J; sqrt(λ D)] δ = [r; 0]`.
///
/// `diag` holds the Marquardt scaling `D` (one entry per column of `jac`).
pub fn solve_damped_step(
    jac: &DMatrix<f64>,
    residuals: &DVector<f64>,
    diag: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let n = jac.nrows();
    let p = jac.ncols();

    let mut aug = DMatrix::<f64>::zeros(n + p, p);
    aug.view_mut((0, 0), (n, p)).copy_from(jac);
    for j in 0..p {
        aug[(n + j, j)] = (lambda * diag[j]).sqrt();
    }

    let mut rhs = DVector::<f64>::zeros(n + p);
    rhs.rows_mut(0, n).copy_from(residuals);

    solve_least_squares(&aug, &rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn damping_shrinks_the_step() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let free = solve_damped_step(&x, &y, &[1.0, 1.0], 0.0).unwrap();
        let damped = solve_damped_step(&x, &y, &[1.0, 1.0], 100.0).unwrap();
        assert!((free[0] - 2.0).abs() < 1e-8);
        assert!(damped.norm() < free.norm());
    }
}
