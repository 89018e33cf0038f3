//! Read/write reference-table JSON files.
//!
//! The file is a JSON array of `{ label, g, g_prime }` entries, e.g. the output
//! of `raman reference`. Labels must be unique.

use std::fs::File;
use std::path::Path;

use crate::classify::ReferenceTable;
use crate::error::AppError;

/// Read a reference table JSON file.
pub fn read_reference_json(path: &Path) -> Result<ReferenceTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open reference JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::from_reader(file).map_err(|e| {
        AppError::new(
            2,
            format!("Invalid reference JSON '{}': {e}", path.display()),
        )
    })
}

/// Write a reference table as pretty JSON.
pub fn write_reference_json(path: &Path, table: &ReferenceTable) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create reference JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::to_writer_pretty(file, table)
        .map_err(|e| AppError::new(2, format!("Failed to write reference JSON: {e}")))
}
