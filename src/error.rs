//! Error types.
//!
//! - `AnalysisError`: typed failures of the numerical core (background, fit,
//!   classification, batch). Every variant knows which stage failed and, where
//!   relevant, which peak.
//! - `AppError`: what the binary reports, carrying a process exit code.

use thiserror::Error;

use crate::domain::{LayerLabel, PeakKind};

/// Pipeline stage in which an `AnalysisError` originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Background,
    Fit,
    Classification,
    Batch,
}

impl Stage {
    pub fn display_name(self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Background => "background",
            Stage::Fit => "fit",
            Stage::Classification => "classification",
            Stage::Batch => "batch",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("[background] spectrum too short: {len} samples (need at least 3)")]
    InsufficientData { len: usize },

    #[error("[input] malformed spectrum: {reason}")]
    MalformedSpectrum { reason: String },

    #[error("[background] spectrum is flat after background removal")]
    DegenerateSpectrum,

    #[error("[fit] peak {peak}: bounds do not bracket the initial guess ({reason})")]
    InvalidBounds { peak: PeakKind, reason: String },

    #[error("[fit] peak {peak}: optimizer did not converge after {iterations} iterations")]
    FitDivergence { peak: PeakKind, iterations: usize },

    #[error("[classification] invalid reference table: {reason}")]
    InvalidReference { reason: String },

    #[error("[classification] reference '{label}' has a zero {field}")]
    ReferenceDegeneracy { label: LayerLabel, field: &'static str },

    #[error("[batch] failed to start worker pool: {reason}")]
    WorkerPool { reason: String },
}

impl AnalysisError {
    pub fn stage(&self) -> Stage {
        match self {
            AnalysisError::MalformedSpectrum { .. } => Stage::Input,
            AnalysisError::InsufficientData { .. } | AnalysisError::DegenerateSpectrum => {
                Stage::Background
            }
            AnalysisError::InvalidBounds { .. } | AnalysisError::FitDivergence { .. } => Stage::Fit,
            AnalysisError::InvalidReference { .. } | AnalysisError::ReferenceDegeneracy { .. } => {
                Stage::Classification
            }
            AnalysisError::WorkerPool { .. } => Stage::Batch,
        }
    }

    /// The peak whose fit failed, if the failure is peak-specific.
    pub fn peak(&self) -> Option<PeakKind> {
        match self {
            AnalysisError::InvalidBounds { peak, .. } | AnalysisError::FitDivergence { peak, .. } => {
                Some(*peak)
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let exit_code = match err.stage() {
            Stage::Input => 2,
            Stage::Batch => 4,
            Stage::Background | Stage::Fit | Stage::Classification => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_name_stage_and_peak() {
        let err = AnalysisError::FitDivergence {
            peak: PeakKind::GPrime,
            iterations: 200,
        };
        assert_eq!(err.stage(), Stage::Fit);
        assert_eq!(err.peak(), Some(PeakKind::GPrime));
        let msg = err.to_string();
        assert!(msg.contains("[fit]"), "{msg}");
        assert!(msg.contains("G′"), "{msg}");
    }

    #[test]
    fn app_error_exit_codes_follow_stage() {
        let app: AppError = AnalysisError::DegenerateSpectrum.into();
        assert_eq!(app.exit_code(), 3);
        let app: AppError = AnalysisError::MalformedSpectrum {
            reason: "x".to_string(),
        }
        .into();
        assert_eq!(app.exit_code(), 2);
    }
}
