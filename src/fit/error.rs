//! Fit error types.

use thiserror::Error;

/// Errors raised while fitting a path or cross-validating it.
///
/// During a sweep these are recorded per mixing coefficient instead of
/// aborting the whole grid.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FitError {
    #[error("no rows to fit")]
    EmptyData,

    #[error("design matrix has {rows} rows but {labels} labels were given")]
    DimensionMismatch { rows: usize, labels: usize },

    #[error("fold assignment covers {folds} rows but {rows} rows were given")]
    FoldMismatch { folds: usize, rows: usize },

    #[error("labels contain a single class; logistic regression needs both")]
    SingleClass,

    #[error("mixing coefficient must be in [0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("solver did not converge at lambda={lambda:.6e} after {iterations} iterations")]
    NoConvergence { lambda: f64, iterations: usize },

    #[error("non-finite coefficients or deviance at lambda={lambda:.6e}")]
    NonFinite { lambda: f64 },

    #[error("fold {fold}: {source}")]
    Fold {
        fold: usize,
        #[source]
        source: Box<FitError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_errors_carry_the_inner_cause() {
        let err = FitError::Fold {
            fold: 3,
            source: Box::new(FitError::SingleClass),
        };
        let msg = err.to_string();
        assert!(msg.contains("fold 3"));
        assert!(msg.contains("single class"));
    }
}
