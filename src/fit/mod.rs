//! Spectrum preparation and peak fitting.
//!
//! Responsibilities:
//!
//! - remove the background and normalize a raw spectrum
//! - hold the per-peak guesses and bounds
//! - fit D, G and G′ independently with the bounded LM solver

pub mod background;
pub mod fitter;
pub mod peaks;

pub use background::*;
pub use fitter::*;
pub use peaks::*;
