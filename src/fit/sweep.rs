//! Parallel sweep over the mixing grid.
//!
//! Every alpha is cross-validated independently on the same fold assignment.
//! Results are collected in grid order regardless of scheduling, and a failed
//! alpha is recorded next to the successful ones instead of aborting the sweep.

use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::fit::{CvFit, FitError, PathOptions, cv_fit};
use crate::partition::FoldAssignment;

/// Outcome for one mixing coefficient.
#[derive(Debug, Clone)]
pub struct SweepEntry {
    pub alpha: f64,
    pub fit: Result<CvFit, FitError>,
}

/// Every grid point, in grid order.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub entries: Vec<SweepEntry>,
}

impl SweepOutcome {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Successful fits in grid order.
    pub fn successes(&self) -> impl Iterator<Item = &CvFit> {
        self.entries.iter().filter_map(|e| e.fit.as_ref().ok())
    }

    /// `(alpha, error)` for each failed grid point.
    pub fn failures(&self) -> impl Iterator<Item = (f64, &FitError)> {
        self.entries
            .iter()
            .filter_map(|e| e.fit.as_ref().err().map(|err| (e.alpha, err)))
    }
}

/// Cross-validate every alpha in `alphas` on the shared fold assignment.
pub fn run_sweep(
    x: &DMatrix<f64>,
    y: &[u8],
    folds: &FoldAssignment,
    alphas: &[f64],
    opts: &PathOptions,
) -> SweepOutcome {
    info!(
        alphas = alphas.len(),
        rows = x.nrows(),
        features = x.ncols(),
        folds = folds.k(),
        "starting sweep"
    );
    sweep_with(alphas, |alpha| cv_fit(x, y, folds, alpha, opts))
}

/// Run `fit` for every alpha in parallel and collect the results in order.
pub fn sweep_with<F>(alphas: &[f64], fit: F) -> SweepOutcome
where
    F: Fn(f64) -> Result<CvFit, FitError> + Sync,
{
    let entries: Vec<SweepEntry> = alphas
        .par_iter()
        .map(|&alpha| SweepEntry { alpha, fit: fit(alpha) })
        .collect();

    for entry in &entries {
        match &entry.fit {
            Ok(cv) => info!(
                alpha = entry.alpha,
                lambda_min = cv.lambda_min(),
                lambda_1se = cv.lambda_1se(),
                "alpha fitted"
            ),
            Err(e) => warn!(alpha = entry.alpha, error = %e, "alpha failed"),
        }
    }

    SweepOutcome { entries }
}
