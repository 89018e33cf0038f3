//! Spectrum and map ingest.
//!
//! Instrument exports vary a lot, so ingest is lenient about layout and strict
//! about content:
//!
//! - delimiter is sniffed from the first data line (`;`, tab, `,` or spaces)
//! - leading non-numeric lines are treated as headers and skipped
//! - `#` lines are comments
//! - with a non-comma delimiter, decimal commas are accepted (`1581,6`)
//! - a bad row after the data started is skipped and reported as a `RowError`
//!
//! Spectra are sorted by shift ascending, since many instruments export them
//! descending.

use std::collections::BTreeMap;
use std::path::Path;

use log::warn;

use crate::domain::{Position, SpatialMap, Spectrum};
use crate::error::AppError;

/// Maps whose axes differ by less than this (cm⁻¹) share one axis.
const AXIS_TOLERANCE: f64 = 1e-6;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output for a single spectrum.
#[derive(Debug, Clone)]
pub struct IngestedSpectrum {
    pub spectrum: Spectrum,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// A map position dropped because its axis does not match the shared one.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPosition {
    pub position: Position,
    pub reason: String,
}

/// Ingest output for a spatial map.
#[derive(Debug, Clone)]
pub struct IngestedMap {
    pub map: SpatialMap,
    pub row_errors: Vec<RowError>,
    pub skipped: Vec<SkippedPosition>,
    pub rows_read: usize,
}

/// Numeric rows of a delimited text file.
struct NumericTable {
    rows: Vec<(usize, Vec<f64>)>,
    row_errors: Vec<RowError>,
    rows_read: usize,
}

/// Load a single spectrum.
///
/// Two columns are `(shift, intensity)`. A single column holds all shifts
/// followed by all intensities.
pub fn read_spectrum(path: &Path) -> Result<IngestedSpectrum, AppError> {
    let mut table = read_numeric_table(path)?;
    let width = first_width(&table, path)?;

    let mut pairs: Vec<(f64, f64)> = match width {
        1 => {
            let values: Vec<f64> = take_rows_of_width(&mut table, 1)
                .into_iter()
                .map(|v| v[0])
                .collect();
            if values.len() % 2 != 0 {
                return Err(AppError::new(
                    2,
                    format!(
                        "Single-column spectrum '{}' has an odd number of values ({}).",
                        path.display(),
                        values.len()
                    ),
                ));
            }
            let (shifts, intensities) = values.split_at(values.len() / 2);
            shifts.iter().copied().zip(intensities.iter().copied()).collect()
        }
        2 => take_rows_of_width(&mut table, 2)
            .into_iter()
            .map(|v| (v[0], v[1]))
            .collect(),
        n => {
            return Err(AppError::new(
                2,
                format!(
                    "Spectrum '{}' has {n} columns; expected 1 or 2.",
                    path.display()
                ),
            ));
        }
    };

    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let spectrum = Spectrum::from_pairs(&pairs)?;

    Ok(IngestedSpectrum {
        spectrum,
        row_errors: table.row_errors,
        rows_read: table.rows_read,
    })
}

/// Load a long-format map export: one `x, y, shift, intensity` row per sample.
///
/// The shift axis shared by the most positions becomes the map axis (ties go
/// to the axis seen first in the file). Positions whose sorted axis differs
/// from it are skipped and reported.
pub fn read_map(path: &Path) -> Result<IngestedMap, AppError> {
    let mut table = read_numeric_table(path)?;
    let width = first_width(&table, path)?;
    if width != 4 {
        return Err(AppError::new(
            2,
            format!(
                "Map '{}' has {width} columns; expected x, y, shift, intensity.",
                path.display()
            ),
        ));
    }

    let mut order: Vec<Position> = Vec::new();
    let mut groups: BTreeMap<Position, Vec<(f64, f64)>> = BTreeMap::new();
    for v in take_rows_of_width(&mut table, 4) {
        let position = Position::new(v[0], v[1]);
        groups
            .entry(position)
            .or_insert_with(|| {
                order.push(position);
                Vec::new()
            })
            .push((v[2], v[3]));
    }

    for samples in groups.values_mut() {
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    let shared = majority_axis(&order, &groups);
    let mut map = SpatialMap::new(shared);
    let mut skipped = Vec::new();
    for position in order {
        let Some(samples) = groups.remove(&position) else {
            continue;
        };
        match axis_mismatch(&map.shifts, &samples) {
            None => map.insert(position, samples.into_iter().map(|s| s.1).collect()),
            Some(reason) => {
                warn!("map position {position} skipped: {reason}");
                skipped.push(SkippedPosition { position, reason });
            }
        }
    }

    Ok(IngestedMap {
        map,
        row_errors: table.row_errors,
        skipped,
        rows_read: table.rows_read,
    })
}

/// The axis most positions agree on, within `AXIS_TOLERANCE`.
fn majority_axis(order: &[Position], groups: &BTreeMap<Position, Vec<(f64, f64)>>) -> Vec<f64> {
    let mut candidates: Vec<(Vec<f64>, usize)> = Vec::new();
    for samples in order.iter().filter_map(|p| groups.get(p)) {
        match candidates
            .iter_mut()
            .find(|(axis, _)| axis_mismatch(axis, samples).is_none())
        {
            Some((_, count)) => *count += 1,
            None => candidates.push((samples.iter().map(|s| s.0).collect(), 1)),
        }
    }

    let mut best: Option<(Vec<f64>, usize)> = None;
    for (axis, count) in candidates {
        if best.as_ref().is_none_or(|(_, top)| count > *top) {
            best = Some((axis, count));
        }
    }
    best.map(|(axis, _)| axis).unwrap_or_default()
}

fn axis_mismatch(shared: &[f64], samples: &[(f64, f64)]) -> Option<String> {
    if samples.len() != shared.len() {
        return Some(format!(
            "{} samples, shared axis has {}",
            samples.len(),
            shared.len()
        ));
    }
    shared
        .iter()
        .zip(samples)
        .find(|(w, s)| (*w - s.0).abs() > AXIS_TOLERANCE)
        .map(|(w, s)| format!("shift {} does not match shared axis value {w}", s.0))
}

fn read_numeric_table(path: &Path) -> Result<NumericTable, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))?;
    // Excel-style UTF-8 BOM.
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for result in reader.records() {
        rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line() as usize);
                push_row_error(&mut row_errors, line, format!("CSV parse error: {e}"));
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line() as usize);

        // Runs of spaces produce empty fields.
        let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
        if fields.is_empty() {
            continue;
        }

        match parse_fields(&fields, delimiter) {
            Ok(values) => rows.push((line, values)),
            // Header lines before the first data row.
            Err(_) if rows.is_empty() => {}
            Err(message) => push_row_error(&mut row_errors, line, message),
        }
    }

    Ok(NumericTable {
        rows,
        row_errors,
        rows_read,
    })
}

fn push_row_error(errors: &mut Vec<RowError>, line: usize, message: String) {
    warn!("line {line}: {message}");
    errors.push(RowError { line, message });
}

fn parse_fields(fields: &[&str], delimiter: u8) -> Result<Vec<f64>, String> {
    fields
        .iter()
        .map(|field| {
            let normalized = if delimiter != b',' {
                field.replace(',', ".")
            } else {
                field.to_string()
            };
            match normalized.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                Ok(_) => Err(format!("non-finite value '{field}'")),
                Err(_) => Err(format!("non-numeric field '{field}'")),
            }
        })
        .collect()
}

/// Pick the delimiter from the first line that starts like a number.
fn sniff_delimiter(text: &str) -> u8 {
    let data_line = text.lines().map(str::trim).find(|line| {
        line.chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
    });
    let Some(line) = data_line else {
        return b',';
    };
    if line.contains(';') {
        b';'
    } else if line.contains('\t') {
        b'\t'
    } else if line.contains(',') {
        b','
    } else {
        b' '
    }
}

fn first_width(table: &NumericTable, path: &Path) -> Result<usize, AppError> {
    table
        .rows
        .first()
        .map(|(_, values)| values.len())
        .ok_or_else(|| AppError::new(2, format!("No numeric rows in '{}'.", path.display())))
}

/// Drain rows with exactly `width` values; others become row errors.
fn take_rows_of_width(table: &mut NumericTable, width: usize) -> Vec<Vec<f64>> {
    let mut kept = Vec::with_capacity(table.rows.len());
    for (line, values) in std::mem::take(&mut table.rows) {
        if values.len() == width {
            kept.push(values);
        } else {
            push_row_error(
                &mut table.row_errors,
                line,
                format!("expected {width} fields, found {}", values.len()),
            );
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("shift;intensity\n1200,5;10\n"), b';');
        assert_eq!(sniff_delimiter("1200\t10\n"), b'\t');
        assert_eq!(sniff_delimiter("# comment, here\n1200,10\n"), b',');
        assert_eq!(sniff_delimiter("  1200   10\n"), b' ');
    }

    #[test]
    fn two_column_file_with_header_is_sorted() {
        let file = write_temp("shift,intensity\n1300,3\n1100,1\n1200,2\n");
        let ingest = read_spectrum(file.path()).unwrap();
        assert_eq!(ingest.spectrum.shifts(), &[1100.0, 1200.0, 1300.0]);
        assert_eq!(ingest.spectrum.intensities(), &[1.0, 2.0, 3.0]);
        assert!(ingest.row_errors.is_empty());
    }

    #[test]
    fn single_column_is_split_in_half() {
        let file = write_temp("1100\n1200\n1300\n5\n6\n7\n");
        let ingest = read_spectrum(file.path()).unwrap();
        assert_eq!(ingest.spectrum.shifts(), &[1100.0, 1200.0, 1300.0]);
        assert_eq!(ingest.spectrum.intensities(), &[5.0, 6.0, 7.0]);

        let odd = write_temp("1100\n1200\n5\n");
        assert_eq!(read_spectrum(odd.path()).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn whitespace_and_decimal_commas() {
        let file = write_temp("  1100   1\n1200 2\n");
        let ingest = read_spectrum(file.path()).unwrap();
        assert_eq!(ingest.spectrum.shifts(), &[1100.0, 1200.0]);
        assert_eq!(ingest.spectrum.intensities(), &[1.0, 2.0]);

        let file = write_temp("1100,5;1\n1200,5;2\n");
        let ingest = read_spectrum(file.path()).unwrap();
        assert_eq!(ingest.spectrum.shifts(), &[1100.5, 1200.5]);
    }

    #[test]
    fn bad_rows_are_reported_and_skipped() {
        let file = write_temp("1100,1\n1200,oops\n1300,3\n1400,4,9\n");
        let ingest = read_spectrum(file.path()).unwrap();
        assert_eq!(ingest.spectrum.len(), 2);
        assert_eq!(ingest.row_errors.len(), 2);
        assert_eq!(ingest.row_errors[0].line, 2);
        assert_eq!(ingest.row_errors[1].line, 4);
    }

    #[test]
    fn duplicate_shifts_are_rejected() {
        let file = write_temp("1100,1\n1100,2\n1200,3\n");
        assert_eq!(read_spectrum(file.path()).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn map_groups_positions_and_skips_mismatched_axes() {
        let file = write_temp(
            "x,y,shift,intensity\n\
             0,0,1200,1\n0,0,1100,2\n\
             1,0,1100,3\n1,0,1200,4\n\
             2,0,1100,5\n2,0,1250,6\n",
        );
        let ingest = read_map(file.path()).unwrap();
        assert_eq!(ingest.map.shifts, vec![1100.0, 1200.0]);
        assert_eq!(ingest.map.len(), 2);
        assert_eq!(ingest.map.points[&Position::new(0.0, 0.0)], vec![2.0, 1.0]);
        assert_eq!(ingest.map.points[&Position::new(1.0, 0.0)], vec![3.0, 4.0]);
        assert_eq!(ingest.skipped.len(), 1);
        assert_eq!(ingest.skipped[0].position, Position::new(2.0, 0.0));
    }

    #[test]
    fn truncated_first_position_does_not_define_the_axis() {
        let file = write_temp(
            "0,0,1100,9\n0,0,1200,9\n\
             1,0,1100,1\n1,0,1200,2\n1,0,1300,3\n\
             2,0,1100,4\n2,0,1200,5\n2,0,1300,6\n",
        );
        let ingest = read_map(file.path()).unwrap();
        assert_eq!(ingest.map.shifts, vec![1100.0, 1200.0, 1300.0]);
        assert_eq!(ingest.map.len(), 2);
        assert_eq!(ingest.map.points[&Position::new(2.0, 0.0)], vec![4.0, 5.0, 6.0]);
        assert_eq!(ingest.skipped.len(), 1);
        assert_eq!(ingest.skipped[0].position, Position::new(0.0, 0.0));
    }

    #[test]
    fn axis_tie_goes_to_the_first_seen() {
        let file = write_temp("0,0,1100,1\n0,0,1200,2\n1,0,1100,3\n1,0,1250,4\n");
        let ingest = read_map(file.path()).unwrap();
        assert_eq!(ingest.map.shifts, vec![1100.0, 1200.0]);
        assert_eq!(ingest.skipped[0].position, Position::new(1.0, 0.0));
    }

    #[test]
    fn map_needs_four_columns() {
        let file = write_temp("0,0,1200\n");
        assert_eq!(read_map(file.path()).unwrap_err().exit_code(), 2);
    }
}
