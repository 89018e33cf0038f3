//! Parallel analysis of every point of a spatial map.
//!
//! One task per position on a dedicated, bounded rayon pool. Workers only read
//! the shared `Analyzer` and `SpatialMap`; results are gathered into a fresh
//! map keyed by position. A failing point never affects the others.

use std::collections::BTreeMap;

use log::{info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::app::pipeline::Analyzer;
use crate::domain::{FitResult, Position, SpatialMap, Spectrum};
use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker count; `None` lets rayon pick (available parallelism).
    pub threads: Option<usize>,
}

/// Per-position outcome of a map run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapFitResult {
    pub points: BTreeMap<Position, Result<FitResult, AnalysisError>>,
}

impl MapFitResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.points.values().filter(|r| r.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn get(&self, position: &Position) -> Option<&Result<FitResult, AnalysisError>> {
        self.points.get(position)
    }
}

impl Analyzer {
    /// Analyze every position of `map` in parallel.
    ///
    /// The only batch-level failure is the worker pool failing to start; every
    /// analysis error is recorded against its position.
    pub fn fit_map(
        &self,
        map: &SpatialMap,
        opts: &BatchOptions,
    ) -> Result<MapFitResult, AnalysisError> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(threads) = opts.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().map_err(|e| AnalysisError::WorkerPool {
            reason: e.to_string(),
        })?;

        info!(
            "analyzing {} map points on {} threads",
            map.len(),
            pool.current_num_threads()
        );

        let tasks: Vec<(&Position, &Vec<f64>)> = map.points.iter().collect();
        let points: BTreeMap<Position, Result<FitResult, AnalysisError>> = pool.install(|| {
            tasks
                .par_iter()
                .map(|&(position, intensities)| {
                    let outcome = self.fit_point(&map.shifts, intensities);
                    if let Err(err) = &outcome {
                        warn!("point {position}: {err}");
                    }
                    (*position, outcome)
                })
                .collect()
        });

        let result = MapFitResult { points };
        info!(
            "map done: {} ok, {} failed",
            result.success_count(),
            result.failure_count()
        );
        Ok(result)
    }

    fn fit_point(&self, shifts: &[f64], intensities: &[f64]) -> Result<FitResult, AnalysisError> {
        if intensities.len() != shifts.len() {
            return Err(AnalysisError::MalformedSpectrum {
                reason: format!(
                    "{} intensities for a {}-sample shift axis",
                    intensities.len(),
                    shifts.len()
                ),
            });
        }
        let spectrum = Spectrum::new(shifts.to_vec(), intensities.to_vec())?;
        self.fit(&spectrum)
    }
}
