//! Reference G / G′ parameters per layer count.
//!
//! The built-in table holds one entry per label. Amplitudes are in normalized
//! intensity units (the same scale the fitter works in), widths and positions
//! in cm⁻¹. Widths lie inside the fitter's G / G′ bounds so every entry is
//! reachable by a fit. The table is plain data: it is handed to the classifier
//! by value and can be replaced wholesale (e.g. from a JSON file).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{LayerLabel, PeakParameters};
use crate::error::AnalysisError;

/// One reference measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub label: LayerLabel,
    pub g: PeakParameters,
    pub g_prime: PeakParameters,
}

/// Ordered, label-unique set of reference entries.
///
/// Serialized as a plain JSON array of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ReferenceEntry>", into = "Vec<ReferenceEntry>")]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
}

const DEFAULT_ENTRIES: [ReferenceEntry; 6] = [
    ReferenceEntry {
        label: LayerLabel::Monolayer,
        g: PeakParameters::new(0.35, 34.0, 1587.0),
        g_prime: PeakParameters::new(1.00, 33.0, 2680.0),
    },
    ReferenceEntry {
        label: LayerLabel::Bilayer,
        g: PeakParameters::new(0.55, 36.0, 1584.0),
        g_prime: PeakParameters::new(0.90, 45.0, 2690.0),
    },
    ReferenceEntry {
        label: LayerLabel::Trilayer,
        g: PeakParameters::new(0.75, 38.0, 1583.0),
        g_prime: PeakParameters::new(0.75, 50.0, 2697.0),
    },
    ReferenceEntry {
        label: LayerLabel::FourLayers,
        g: PeakParameters::new(0.85, 40.0, 1582.0),
        g_prime: PeakParameters::new(0.62, 54.0, 2702.0),
    },
    ReferenceEntry {
        label: LayerLabel::FiveLayers,
        g: PeakParameters::new(0.92, 41.0, 1581.5),
        g_prime: PeakParameters::new(0.52, 56.0, 2706.0),
    },
    ReferenceEntry {
        label: LayerLabel::Graphene,
        g: PeakParameters::new(1.00, 43.0, 1581.0),
        g_prime: PeakParameters::new(0.42, 58.0, 2716.0),
    },
];

impl ReferenceTable {
    /// Build a table, rejecting empty input and duplicate labels.
    pub fn new(entries: Vec<ReferenceEntry>) -> Result<Self, AnalysisError> {
        if entries.is_empty() {
            return Err(AnalysisError::InvalidReference {
                reason: "table has no entries".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.label) {
                return Err(AnalysisError::InvalidReference {
                    reason: format!("duplicate entry for '{}'", entry.label),
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn get(&self, label: LayerLabel) -> Option<&ReferenceEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES.to_vec(),
        }
    }
}

impl TryFrom<Vec<ReferenceEntry>> for ReferenceTable {
    type Error = AnalysisError;

    fn try_from(entries: Vec<ReferenceEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<ReferenceTable> for Vec<ReferenceEntry> {
    fn from(table: ReferenceTable) -> Self {
        table.entries
    }
}
