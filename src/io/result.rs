//! Read/write fit-result JSON files.
//!
//! A fit file is the portable record of one analysis: the full `FitResult`
//! (peaks, normalized spectrum, composite curve, scores) plus where it came
//! from and when it was produced.

use std::fs::File;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::domain::FitResult;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    /// RFC 3339 local time.
    pub generated_at: String,
    /// Input spectrum path, if the result came from a file.
    pub source: Option<String>,
    pub result: FitResult,
}

impl FitFile {
    pub fn new(result: FitResult, source: Option<&Path>) -> Self {
        Self {
            tool: "raman".to_string(),
            generated_at: Local::now().to_rfc3339(),
            source: source.map(|p| p.display().to_string()),
            result,
        }
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, file: &FitFile) -> Result<(), AppError> {
    let out = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create fit JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open fit JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))
}
