//! Export per-position map results to CSV.
//!
//! One row per position, failed positions included (with empty numeric fields
//! and the error text), so the file lines up with the input grid.

use std::path::Path;

use crate::app::batch::MapFitResult;
use crate::domain::{FitResult, PeakKind, Spectrum};
use crate::error::AppError;

/// Write map results to a CSV file.
pub fn write_map_csv(path: &Path, result: &MapFitResult) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;

    writer
        .write_record(header())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (position, outcome) in &result.points {
        let mut row = vec![position.x.to_string(), position.y.to_string()];
        match outcome {
            Ok(fit) => {
                row.push("ok".to_string());
                row.extend(fit_fields(fit));
                row.push(String::new());
            }
            Err(err) => {
                row.push("failed".to_string());
                row.extend(std::iter::repeat_n(String::new(), FIT_FIELD_COUNT));
                row.push(err.to_string());
            }
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write a spectrum as `shift,intensity` CSV (readable by `read_spectrum`).
pub fn write_spectrum_csv(path: &Path, spectrum: &Spectrum) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create spectrum CSV '{}': {e}", path.display()),
        )
    })?;
    writer
        .write_record(["shift", "intensity"])
        .map_err(|e| AppError::new(2, format!("Failed to write spectrum CSV header: {e}")))?;
    for (shift, intensity) in spectrum.shifts().iter().zip(spectrum.intensities()) {
        writer
            .write_record([shift.to_string(), intensity.to_string()])
            .map_err(|e| AppError::new(2, format!("Failed to write spectrum CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush spectrum CSV: {e}")))?;
    Ok(())
}

/// label, score, quality, rmse, then (a, w, b) for D, G, G′.
const FIT_FIELD_COUNT: usize = 4 + 9;

fn header() -> Vec<String> {
    let mut columns: Vec<String> = ["x", "y", "status", "label", "score", "quality", "rmse"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for kind in PeakKind::ALL {
        let prefix = match kind {
            PeakKind::D => "d",
            PeakKind::G => "g",
            PeakKind::GPrime => "g_prime",
        };
        for field in ["amplitude", "fwhm", "center"] {
            columns.push(format!("{prefix}_{field}"));
        }
    }
    columns.push("error".to_string());
    columns
}

fn fit_fields(fit: &FitResult) -> Vec<String> {
    let mut fields = vec![
        fit.classification.label.display_name().to_string(),
        format!("{:.4}", fit.classification.best_score()),
        fit.quality.map(|q| format!("{q:.4}")).unwrap_or_default(),
        format!("{:.6}", fit.goodness.rmse),
    ];
    for kind in PeakKind::ALL {
        let p = fit.peaks.get(kind);
        fields.push(format!("{:.6}", p.amplitude));
        fields.push(format!("{:.4}", p.fwhm));
        fields.push(format!("{:.4}", p.center));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;
    use crate::error::AnalysisError;

    #[test]
    fn failed_points_keep_their_row() {
        let mut result = MapFitResult::default();
        result
            .points
            .insert(Position::new(1.5, -2.0), Err(AnalysisError::DegenerateSpectrum));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.csv");
        write_map_csv(&path, &result).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 3 + FIT_FIELD_COUNT + 1);
        assert_eq!(&headers[7], "d_amplitude");
        assert_eq!(&headers[15], "g_prime_center");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "1.5");
        assert_eq!(&rows[0][2], "failed");
        assert!(rows[0][16].contains("flat"));
    }

    #[test]
    fn spectrum_csv_reads_back() {
        let spectrum = Spectrum::new(vec![1200.0, 1200.5, 1201.0], vec![3.25, 4.0, 1e-7]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.csv");
        write_spectrum_csv(&path, &spectrum).unwrap();

        let back = crate::io::read_spectrum(&path).unwrap();
        assert_eq!(back.spectrum, spectrum);
        assert!(back.row_errors.is_empty());
    }
}
