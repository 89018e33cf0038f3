//! Formatted terminal output.
//!
//! We keep formatting code in one place so the fitting code stays clean and
//! output changes are localized.

use std::collections::BTreeMap;

use crate::app::batch::MapFitResult;
use crate::domain::{FitResult, LayerLabel, PeakKind};

/// Format the result of a single-spectrum analysis.
pub fn format_fit_summary(result: &FitResult, source: &str) -> String {
    let mut out = String::new();

    out.push_str("=== raman - graphene layer analysis ===\n");
    out.push_str(&format!("Input: {source}\n"));
    out.push_str(&format!(
        "Samples: n={} | shift=[{:.1}, {:.1}] cm⁻¹\n",
        result.normalized.len(),
        result.normalized.shifts.first().copied().unwrap_or(f64::NAN),
        result.normalized.shifts.last().copied().unwrap_or(f64::NAN),
    ));

    out.push_str("\nPeaks (normalized amplitude, FWHM cm⁻¹, center cm⁻¹):\n");
    for kind in PeakKind::ALL {
        let p = result.peaks.get(kind);
        let iterations = result
            .diagnostics
            .iter()
            .find(|d| d.peak == kind)
            .map(|d| d.iterations)
            .unwrap_or(0);
        out.push_str(&format!(
            "  {:<3} a={:.4}  w={:>6.2}  b={:>7.2}  ({} it)\n",
            kind.display_name(),
            p.amplitude,
            p.fwhm,
            p.center,
            iterations
        ));
    }

    out.push_str(&format!(
        "\nComposite fit: SSE={:.5} | RMSE={:.5}\n",
        result.goodness.sse, result.goodness.rmse
    ));
    match result.quality {
        Some(q) => out.push_str(&format!("Quality (1 - D/G): {q:.3}\n")),
        None => out.push_str("Quality (1 - D/G): n/a (G amplitude is zero)\n"),
    }

    out.push_str("\nReference scores (lower is closer):\n");
    for candidate in &result.classification.scores {
        let marker = if candidate.label == result.classification.label {
            "*"
        } else {
            " "
        };
        out.push_str(&format!(
            " {marker} {:<12} {:>9.3}\n",
            candidate.label.display_name(),
            candidate.score
        ));
    }
    out.push_str(&format!("\nLayers: {}\n", result.classification.label));

    out
}

/// Number of successfully analyzed positions per label, in label order.
pub fn label_counts(result: &MapFitResult) -> BTreeMap<LayerLabel, usize> {
    let mut counts = BTreeMap::new();
    for fit in result.points.values().flatten() {
        *counts.entry(fit.classification.label).or_insert(0) += 1;
    }
    counts
}

/// Format the outcome of a map run.
pub fn format_map_summary(result: &MapFitResult, source: &str, skipped: usize) -> String {
    let mut out = String::new();

    out.push_str("=== raman - map analysis ===\n");
    out.push_str(&format!("Input: {source}\n"));
    out.push_str(&format!(
        "Positions: {} analyzed | {} ok | {} failed | {} skipped at ingest\n",
        result.len(),
        result.success_count(),
        result.failure_count(),
        skipped
    ));

    let counts = label_counts(result);
    if !counts.is_empty() {
        out.push_str("\nLayer distribution:\n");
        for (label, count) in &counts {
            let share = 100.0 * *count as f64 / result.success_count() as f64;
            out.push_str(&format!("  {:<12} {:>6}  ({share:.1}%)\n", label.display_name(), count));
        }
    }

    let failures: Vec<_> = result
        .points
        .iter()
        .filter_map(|(position, outcome)| outcome.as_ref().err().map(|e| (position, e)))
        .collect();
    if !failures.is_empty() {
        out.push_str("\nFailed positions:\n");
        for (position, err) in failures {
            out.push_str(&format!("  {position}: {err}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CandidateScore, ClassificationResult, FitQuality, NormalizedSpectrum, PeakParameters,
        PeakSet, Position,
    };
    use crate::error::AnalysisError;

    fn fit_labeled(label: LayerLabel) -> FitResult {
        let p = PeakParameters::new(0.5, 40.0, 1582.0);
        FitResult {
            peaks: PeakSet {
                d: p,
                g: p,
                g_prime: p,
            },
            diagnostics: Vec::new(),
            normalized: NormalizedSpectrum {
                shifts: vec![1200.0, 3000.0],
                intensities: vec![0.0, 1.0],
            },
            curve: vec![0.0, 0.0],
            quality: None,
            goodness: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                n: 2,
            },
            classification: ClassificationResult {
                scores: vec![CandidateScore { label, score: 1.25 }],
                label,
            },
        }
    }

    #[test]
    fn fit_summary_names_label_and_missing_quality() {
        let text = format_fit_summary(&fit_labeled(LayerLabel::FourLayers), "a.csv");
        assert!(text.contains("Layers: four layers"), "{text}");
        assert!(text.contains("n/a"), "{text}");
        assert!(text.contains("G′"), "{text}");
    }

    #[test]
    fn map_summary_counts_labels_and_lists_failures() {
        let mut result = MapFitResult::default();
        result.points.insert(Position::new(0.0, 0.0), Ok(fit_labeled(LayerLabel::Bilayer)));
        result.points.insert(Position::new(1.0, 0.0), Ok(fit_labeled(LayerLabel::Bilayer)));
        result.points.insert(Position::new(2.0, 0.0), Ok(fit_labeled(LayerLabel::Monolayer)));
        result
            .points
            .insert(Position::new(3.0, 0.0), Err(AnalysisError::DegenerateSpectrum));

        let counts = label_counts(&result);
        assert_eq!(counts[&LayerLabel::Bilayer], 2);
        assert_eq!(counts[&LayerLabel::Monolayer], 1);

        let text = format_map_summary(&result, "map.csv", 1);
        assert!(text.contains("4 analyzed | 3 ok | 1 failed | 1 skipped"), "{text}");
        assert!(text.contains("(3, 0)"), "{text}");
    }
}
