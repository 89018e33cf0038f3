//! Layer-count classification by nearest reference.
//!
//! For every reference entry `L` we compute percent deviations of the fitted
//! parameters `P` from `L`:
//!
//! ```text
//! dGp    = wavg(|100 (P − L) / L| over (a, w, b) of G′, weights [1, 1, 0.5])
//! dG     = wavg(|100 (P − L) / L| over (a, w, b) of G,  weights [1, 1, 0.5])
//! dRatio = |100 ((a_G / a_G′ − L_aG / L_aG′) / (L_aG / L_aG′))|
//! score  = wavg([dGp, dG, dRatio], weights [0.5, 0.5, 1])
//! ```
//!
//! and select the entry with the lowest score. Ties go to the entry that comes
//! first in the table.

use crate::classify::reference::{ReferenceEntry, ReferenceTable};
use crate::domain::{CandidateScore, ClassificationResult, LayerLabel, PeakParameters};
use crate::error::AnalysisError;

const PEAK_WEIGHTS: [f64; 3] = [1.0, 1.0, 0.5];
const SCORE_WEIGHTS: [f64; 3] = [0.5, 0.5, 1.0];

/// Scores fitted G / G′ parameters against an injected reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerClassifier {
    reference: ReferenceTable,
}

impl Default for LayerClassifier {
    fn default() -> Self {
        Self::new(ReferenceTable::default())
    }
}

impl LayerClassifier {
    pub fn new(reference: ReferenceTable) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceTable {
        &self.reference
    }

    /// Score every reference entry and pick the best (lowest) one.
    pub fn classify(
        &self,
        g: &PeakParameters,
        g_prime: &PeakParameters,
    ) -> Result<ClassificationResult, AnalysisError> {
        let scores = self
            .reference
            .entries()
            .iter()
            .map(|entry| {
                score_candidate(g, g_prime, entry).map(|score| CandidateScore {
                    label: entry.label,
                    score,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Strict `<` keeps the first entry on ties (and never selects NaN over a number).
        let mut best = &scores[0];
        for candidate in &scores[1..] {
            if candidate.score < best.score || (best.score.is_nan() && !candidate.score.is_nan()) {
                best = candidate;
            }
        }
        let label = best.label;

        Ok(ClassificationResult { scores, label })
    }
}

/// Deviation score of fitted G / G′ against one reference entry.
pub fn score_candidate(
    g: &PeakParameters,
    g_prime: &PeakParameters,
    entry: &ReferenceEntry,
) -> Result<f64, AnalysisError> {
    let d_gp = peak_deviation(g_prime, &entry.g_prime, entry.label, GP_FIELDS)?;
    let d_g = peak_deviation(g, &entry.g, entry.label, G_FIELDS)?;

    let ref_ratio = entry.g.amplitude / entry.g_prime.amplitude;
    let fit_ratio = g.amplitude / g_prime.amplitude;
    let d_ratio = (100.0 * ((fit_ratio - ref_ratio) / ref_ratio)).abs();

    Ok(weighted_average(&[d_gp, d_g, d_ratio], &SCORE_WEIGHTS))
}

const G_FIELDS: [&str; 3] = ["G amplitude", "G fwhm", "G center"];
const GP_FIELDS: [&str; 3] = ["G′ amplitude", "G′ fwhm", "G′ center"];

fn peak_deviation(
    fitted: &PeakParameters,
    reference: &PeakParameters,
    label: LayerLabel,
    fields: [&'static str; 3],
) -> Result<f64, AnalysisError> {
    let p = fitted.to_array();
    let l = reference.to_array();
    let mut deviations = [0.0; 3];
    for j in 0..3 {
        if l[j] == 0.0 {
            return Err(AnalysisError::ReferenceDegeneracy {
                label,
                field: fields[j],
            });
        }
        deviations[j] = (100.0 * (p[j] - l[j]) / l[j]).abs();
    }
    Ok(weighted_average(&deviations, &PEAK_WEIGHTS))
}

/// `Σ wᵢ xᵢ / Σ wᵢ`
fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    values.iter().zip(weights.iter()).map(|(v, w)| v * w).sum::<f64>() / total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: LayerLabel, g: [f64; 3], g_prime: [f64; 3]) -> ReferenceEntry {
        ReferenceEntry {
            label,
            g: PeakParameters::from_array(g),
            g_prime: PeakParameters::from_array(g_prime),
        }
    }

    #[test]
    fn exact_reference_match_scores_zero_and_wins() {
        let classifier = LayerClassifier::default();
        for reference in classifier.reference().entries() {
            let result = classifier.classify(&reference.g, &reference.g_prime).unwrap();
            assert_eq!(result.score_for(reference.label), Some(0.0));
            assert_eq!(result.label, reference.label);
            assert_eq!(result.scores.len(), 6);
        }
    }

    #[test]
    fn score_follows_weighted_formula() {
        let reference = entry(LayerLabel::Bilayer, [1.0, 10.0, 1000.0], [2.0, 20.0, 2000.0]);
        let g = PeakParameters::new(1.1, 10.0, 1000.0);
        let g_prime = PeakParameters::new(2.0, 20.0, 2000.0);

        // dG = (10·1 + 0 + 0) / 2.5 = 4, dGp = 0, dRatio = 10
        // score = (0.5·0 + 0.5·4 + 1·10) / 2 = 6
        let score = score_candidate(&g, &g_prime, &reference).unwrap();
        assert!((score - 6.0).abs() < 1e-9, "{score}");
    }

    #[test]
    fn ties_go_to_the_first_entry() {
        let values = ([0.5, 20.0, 1582.0], [1.0, 40.0, 2690.0]);
        let table = ReferenceTable::new(vec![
            entry(LayerLabel::Trilayer, values.0, values.1),
            entry(LayerLabel::Bilayer, values.0, values.1),
        ])
        .unwrap();
        let classifier = LayerClassifier::new(table);

        let result = classifier
            .classify(&PeakParameters::new(0.6, 35.0, 1590.0), &PeakParameters::new(0.9, 45.0, 2700.0))
            .unwrap();
        assert_eq!(result.scores[0].score, result.scores[1].score);
        assert_eq!(result.label, LayerLabel::Trilayer);
    }

    #[test]
    fn synthetic_reference_sets_can_be_injected() {
        let table = ReferenceTable::new(vec![
            entry(LayerLabel::Monolayer, [0.3, 35.0, 1585.0], [1.0, 35.0, 2680.0]),
            entry(LayerLabel::Graphene, [1.0, 45.0, 1580.0], [0.4, 60.0, 2720.0]),
        ])
        .unwrap();
        let classifier = LayerClassifier::new(table);
        let result = classifier
            .classify(&PeakParameters::new(0.95, 44.0, 1580.5), &PeakParameters::new(0.42, 58.0, 2718.0))
            .unwrap();
        assert_eq!(result.label, LayerLabel::Graphene);
        assert!(result.best_score() < result.score_for(LayerLabel::Monolayer).unwrap());
    }

    #[test]
    fn zero_reference_value_is_reported() {
        let table = ReferenceTable::new(vec![entry(
            LayerLabel::FourLayers,
            [0.9, 0.0, 1581.0],
            [0.6, 55.0, 2700.0],
        )])
        .unwrap();
        let err = LayerClassifier::new(table)
            .classify(&PeakParameters::new(0.9, 40.0, 1581.0), &PeakParameters::new(0.6, 55.0, 2700.0))
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ReferenceDegeneracy {
                label: LayerLabel::FourLayers,
                field: "G fwhm"
            }
        );
    }
}
