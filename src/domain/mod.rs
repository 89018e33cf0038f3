//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - spectra (`Spectrum`, `NormalizedSpectrum`) and 2-D maps (`SpatialMap`)
//! - peak parameters and fit outputs (`PeakParameters`, `FitResult`, etc.)
//! - classification labels and scores (`LayerLabel`, `ClassificationResult`)

pub mod types;

pub use types::*;
