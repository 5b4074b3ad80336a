//! K-fold cross-validation of a regularization path.
//!
//! - The full training set is fitted first; its lambda sequence is reused by
//!   every fold so the per-lambda errors line up.
//! - Per-observation binomial deviance is averaged within each fold, then the
//!   fold means are combined weighted by fold size.
//! - `cvsd` is the weighted spread of the fold means divided by `K - 1`.

use nalgebra::DMatrix;
use tracing::debug;

use crate::domain::SelectionRule;
use crate::fit::{FitError, PathOptions, RegularizationPath, fit_path};
use crate::math::weighted_mean;
use crate::partition::FoldAssignment;

/// Probabilities are clamped to this distance from 0 and 1 when scoring folds.
const PROB_CLAMP: f64 = 1e-5;

/// Cross-validated path for one mixing coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct CvFit {
    pub alpha: f64,
    /// Fit on every training row.
    pub path: RegularizationPath,
    /// Mean cross-validated deviance per lambda.
    pub cvm: Vec<f64>,
    /// Standard error of `cvm`.
    pub cvsd: Vec<f64>,
    pub index_min: usize,
    pub index_1se: usize,
}

impl CvFit {
    pub fn lambdas(&self) -> &[f64] {
        &self.path.lambdas
    }

    pub fn lambda_min(&self) -> f64 {
        self.path.lambdas[self.index_min]
    }

    pub fn lambda_1se(&self) -> f64 {
        self.path.lambdas[self.index_1se]
    }

    pub fn index_for(&self, rule: SelectionRule) -> usize {
        match rule {
            SelectionRule::MinError => self.index_min,
            SelectionRule::MinErrorPlusOneStdErr => self.index_1se,
        }
    }

    pub fn lambda_for(&self, rule: SelectionRule) -> f64 {
        self.path.lambdas[self.index_for(rule)]
    }

    /// Nonzero coefficients at the lambda chosen by `rule`.
    pub fn nonzero(&self, rule: SelectionRule) -> usize {
        self.path.nonzero(self.index_for(rule))
    }

    /// Probability estimates from the full-data fit at the lambda chosen by `rule`.
    ///
    /// # Panics
    /// Panics if `x` does not have one column per coefficient.
    pub fn predict(&self, x: &DMatrix<f64>, rule: SelectionRule) -> Vec<f64> {
        self.path.predict(x, self.lambda_for(rule))
    }
}

/// Fit the full path and cross-validate it on `folds`.
pub fn cv_fit(
    x: &DMatrix<f64>,
    y: &[u8],
    folds: &FoldAssignment,
    alpha: f64,
    opts: &PathOptions,
) -> Result<CvFit, FitError> {
    if folds.len() != x.nrows() {
        return Err(FitError::FoldMismatch {
            folds: folds.len(),
            rows: x.nrows(),
        });
    }

    let path = fit_path(x, y, alpha, None, opts)?;
    let lambdas = path.lambdas.clone();

    let k = folds.k();
    let mut fold_means = Vec::with_capacity(k);
    let mut fold_sizes = Vec::with_capacity(k);

    for fold in 0..k {
        let train = folds.complement(fold);
        let held = folds.holdout(fold);

        let x_fit = x.select_rows(train.iter());
        let y_fit: Vec<u8> = train.iter().map(|&i| y[i]).collect();
        let fold_path =
            fit_path(&x_fit, &y_fit, alpha, Some(lambdas.as_slice()), opts).map_err(|e| FitError::Fold {
                fold,
                source: Box::new(e),
            })?;

        let x_held = x.select_rows(held.iter());
        let y_held: Vec<u8> = held.iter().map(|&i| y[i]).collect();
        let last = fold_path.len() - 1;
        let means: Vec<f64> = (0..lambdas.len())
            .map(|idx| {
                // A shorter fold path keeps predicting with its last solution.
                let probs = fold_path.predict_at(&x_held, idx.min(last));
                mean_pointwise_deviance(&y_held, &probs)
            })
            .collect();

        fold_means.push(means);
        fold_sizes.push(held.len());
    }

    let (cvm, cvsd) = aggregate_folds(&fold_means, &fold_sizes);
    if cvm.iter().chain(&cvsd).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite {
            lambda: lambdas[lambdas.len() - 1],
        });
    }
    let (index_min, index_1se) = select_indices(&cvm, &cvsd);

    debug!(
        alpha,
        lambda_min = lambdas[index_min],
        lambda_1se = lambdas[index_1se],
        cvm_min = cvm[index_min],
        "cross-validated path"
    );

    Ok(CvFit {
        alpha,
        path,
        cvm,
        cvsd,
        index_min,
        index_1se,
    })
}

fn mean_pointwise_deviance(y: &[u8], probs: &[f64]) -> f64 {
    let total: f64 = y
        .iter()
        .zip(probs)
        .map(|(&yi, &p)| {
            let p = p.clamp(PROB_CLAMP, 1.0 - PROB_CLAMP);
            if yi == 1 { -2.0 * p.ln() } else { -2.0 * (1.0 - p).ln() }
        })
        .sum();
    total / y.len() as f64
}

/// Combine per-fold mean errors into `(cvm, cvsd)` per lambda.
fn aggregate_folds(fold_means: &[Vec<f64>], fold_sizes: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let weights: Vec<f64> = fold_sizes.iter().map(|&s| s as f64).collect();
    let k = fold_means.len() as f64;
    let n_lambda = fold_means.first().map_or(0, Vec::len);

    let mut cvm = Vec::with_capacity(n_lambda);
    let mut cvsd = Vec::with_capacity(n_lambda);
    for idx in 0..n_lambda {
        let column: Vec<f64> = fold_means.iter().map(|m| m[idx]).collect();
        let m = weighted_mean(&column, &weights);
        let sq: Vec<f64> = column.iter().map(|v| (v - m) * (v - m)).collect();
        cvm.push(m);
        cvsd.push((weighted_mean(&sq, &weights) / (k - 1.0)).sqrt());
    }
    (cvm, cvsd)
}

/// `(index_min, index_1se)`; the earliest (largest-lambda) index wins ties.
fn select_indices(cvm: &[f64], cvsd: &[f64]) -> (usize, usize) {
    let mut index_min = 0;
    for (i, &v) in cvm.iter().enumerate() {
        if v < cvm[index_min] {
            index_min = i;
        }
    }
    let threshold = cvm[index_min] + cvsd[index_min];
    let index_1se = cvm.iter().position(|&v| v <= threshold).unwrap_or(index_min);
    (index_min, index_1se)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::testutil::synthetic_problem;
    use crate::partition::assign_folds;
    use approx::assert_abs_diff_eq;

    fn opts() -> PathOptions {
        PathOptions {
            n_lambda: 25,
            ..PathOptions::default()
        }
    }

    #[test]
    fn aggregate_weights_folds_by_size() {
        let (cvm, cvsd) = aggregate_folds(&[vec![2.0], vec![6.0]], &[1, 3]);
        assert_abs_diff_eq!(cvm[0], 5.0);
        // weighted mean of squared deviations = (9 + 3) / 4, divided by K - 1 = 1
        assert_abs_diff_eq!(cvsd[0], 3.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn selection_prefers_larger_lambda_on_ties() {
        let cvm = [3.0, 2.0, 1.5, 1.5, 1.6];
        let cvsd = [0.1, 0.1, 0.6, 0.1, 0.1];
        assert_eq!(select_indices(&cvm, &cvsd), (2, 1));
    }

    #[test]
    fn pointwise_deviance_clamps_probabilities() {
        let d = mean_pointwise_deviance(&[1, 0], &[0.0, 1.0]);
        assert_abs_diff_eq!(d, -2.0 * PROB_CLAMP.ln(), epsilon = 1e-9);
        assert_abs_diff_eq!(mean_pointwise_deviance(&[1], &[0.5]), 2.0 * 2.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn cv_fit_picks_consistent_indices() {
        let (x, y) = synthetic_problem(200, 6, 21);
        let folds = assign_folds(&y, 5, 7).unwrap();
        let fit = cv_fit(&x, &y, &folds, 0.5, &opts()).unwrap();

        assert_eq!(fit.cvm.len(), fit.lambdas().len());
        assert_eq!(fit.cvsd.len(), fit.lambdas().len());
        assert!(fit.index_1se <= fit.index_min);
        assert!(fit.lambda_1se() >= fit.lambda_min());
        let min = fit.cvm.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(fit.cvm[fit.index_min], min);
        assert!(fit.cvm[fit.index_1se] <= fit.cvm[fit.index_min] + fit.cvsd[fit.index_min]);
        assert!(fit.nonzero(SelectionRule::MinErrorPlusOneStdErr) <= x.ncols());
    }

    #[test]
    fn predictions_match_path_at_selected_lambda() {
        let (x, y) = synthetic_problem(150, 4, 22);
        let folds = assign_folds(&y, 5, 8).unwrap();
        let fit = cv_fit(&x, &y, &folds, 1.0, &opts()).unwrap();
        let via_rule = fit.predict(&x, SelectionRule::MinError);
        let via_index = fit.path.predict_at(&x, fit.index_min);
        assert_eq!(via_rule, via_index);
    }

    #[test]
    fn rejects_mismatched_folds() {
        let (x, y) = synthetic_problem(60, 3, 23);
        let folds = assign_folds(&y[..30], 3, 1).unwrap();
        assert_eq!(
            cv_fit(&x, &y, &folds, 1.0, &opts()).unwrap_err(),
            FitError::FoldMismatch { folds: 30, rows: 60 }
        );
    }

    #[test]
    fn cv_is_deterministic() {
        let (x, y) = synthetic_problem(120, 4, 24);
        let folds = assign_folds(&y, 4, 2).unwrap();
        let a = cv_fit(&x, &y, &folds, 0.25, &opts()).unwrap();
        let b = cv_fit(&x, &y, &folds, 0.25, &opts()).unwrap();
        assert_eq!(a, b);
    }
}
