//! Numerical building blocks: linear least squares and bounded Levenberg–Marquardt.

pub mod lm;
pub mod ols;

pub use lm::*;
pub use ols::*;
