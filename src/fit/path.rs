//! Elastic-net penalized logistic regression along a lambda path.
//!
//! For fixed mixing coefficient `alpha` we minimize, for every lambda in a
//! decreasing sequence,
//!
//! ```text
//! -(1/n) loglik(b0, beta) + lambda * ( (1-alpha)/2 ||beta||_2^2 + alpha ||beta||_1 )
//! ```
//!
//! Implementation choices:
//! - Columns are standardized internally (population sd) and coefficients are
//!   mapped back to the caller's scale before they are stored.
//! - Outer loop: iteratively reweighted least squares (quadratic approximation
//!   of the log-likelihood at the current linear predictor).
//! - Inner loop: cyclic coordinate descent with soft-thresholding. After each
//!   full sweep we iterate on the nonzero set only until it settles, then do
//!   another full sweep to let new coefficients enter.
//! - Solutions are warm-started from the previous lambda.
//! - When the sequence is generated here (not supplied), the path stops early
//!   once the explained deviance saturates.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::fit::FitError;
use crate::fit::lambda_grid::{DEFAULT_N_LAMBDA, default_min_ratio, lambda_max, lambda_sequence};
use crate::math::{bernoulli_log_likelihood, logit, mean, population_sd, sigmoid, soft_threshold};

/// IRLS weights are floored so nearly-separated rows keep some curvature.
const WEIGHT_FLOOR: f64 = 1e-5;

/// Stop a generated path once this fraction of null deviance is explained.
const DEV_RATIO_MAX: f64 = 0.999;

/// Stop a generated path when the explained deviance improves by less than this fraction.
const DEV_CHANGE_MIN: f64 = 1e-5;

/// Early stopping is only considered after this many lambdas.
const MIN_LAMBDAS_BEFORE_STOP: usize = 5;

/// Solver options shared by every fit in a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct PathOptions {
    /// Length of a generated lambda sequence.
    pub n_lambda: usize,
    /// Smallest lambda as a fraction of `lambda_max` (data-dependent when `None`).
    pub lambda_min_ratio: Option<f64>,
    /// Convergence threshold on the weighted squared coefficient change.
    pub tol: f64,
    /// IRLS iterations per lambda.
    pub max_iter: usize,
    /// Coordinate-descent sweeps per lambda.
    pub max_passes: usize,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            n_lambda: DEFAULT_N_LAMBDA,
            lambda_min_ratio: None,
            tol: 1e-7,
            max_iter: 100,
            max_passes: 10_000,
        }
    }
}

/// Fitted coefficients for every lambda on the path.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularizationPath {
    pub alpha: f64,
    /// Strictly decreasing.
    pub lambdas: Vec<f64>,
    pub intercepts: Vec<f64>,
    /// Coefficients on the caller's column scale.
    pub betas: Vec<DVector<f64>>,
    /// Fraction of null deviance explained at each lambda.
    pub dev_ratio: Vec<f64>,
    pub null_deviance: f64,
}

impl RegularizationPath {
    pub fn len(&self) -> usize {
        self.lambdas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lambdas.is_empty()
    }

    /// Nonzero coefficients (intercept excluded) at path index `idx`.
    pub fn nonzero(&self, idx: usize) -> usize {
        self.betas[idx].iter().filter(|b| **b != 0.0).count()
    }

    /// Probability estimates at path index `idx`.
    ///
    /// # Panics
    /// Panics if `x` does not have one column per coefficient.
    pub fn predict_at(&self, x: &DMatrix<f64>, idx: usize) -> Vec<f64> {
        linear_predict(x, self.intercepts[idx], &self.betas[idx])
    }

    /// Coefficients at an arbitrary lambda.
    ///
    /// Values between two path lambdas are linearly interpolated in lambda;
    /// values outside the path are clamped to its ends.
    pub fn coefficients_at(&self, lambda: f64) -> (f64, DVector<f64>) {
        let last = self.len() - 1;
        if lambda >= self.lambdas[0] {
            return (self.intercepts[0], self.betas[0].clone());
        }
        if lambda <= self.lambdas[last] {
            return (self.intercepts[last], self.betas[last].clone());
        }

        // lambdas[k] > lambda > lambdas[k + 1]
        let k = self
            .lambdas
            .windows(2)
            .position(|w| w[0] >= lambda && lambda >= w[1])
            .unwrap_or(last - 1);
        let (hi, lo) = (self.lambdas[k], self.lambdas[k + 1]);
        let frac = (lambda - lo) / (hi - lo);
        let b0 = frac * self.intercepts[k] + (1.0 - frac) * self.intercepts[k + 1];
        let beta = &self.betas[k] * frac + &self.betas[k + 1] * (1.0 - frac);
        (b0, beta)
    }

    /// Probability estimates at an arbitrary lambda (see `coefficients_at`).
    ///
    /// # Panics
    /// Panics if `x` does not have one column per coefficient.
    pub fn predict(&self, x: &DMatrix<f64>, lambda: f64) -> Vec<f64> {
        let (b0, beta) = self.coefficients_at(lambda);
        linear_predict(x, b0, &beta)
    }
}

fn linear_predict(x: &DMatrix<f64>, b0: f64, beta: &DVector<f64>) -> Vec<f64> {
    let eta = x * beta;
    eta.iter().map(|e| sigmoid(b0 + e)).collect()
}

/// Fit a penalized logistic regression path.
///
/// When `lambdas` is `None` the sequence is generated from the data and may be
/// truncated by early stopping; a supplied sequence is always fitted in full.
pub fn fit_path(
    x: &DMatrix<f64>,
    y: &[u8],
    alpha: f64,
    lambdas: Option<&[f64]>,
    opts: &PathOptions,
) -> Result<RegularizationPath, FitError> {
    let n = x.nrows();
    let p = x.ncols();
    if n == 0 {
        return Err(FitError::EmptyData);
    }
    if y.len() != n {
        return Err(FitError::DimensionMismatch { rows: n, labels: y.len() });
    }
    if !(alpha.is_finite() && (0.0..=1.0).contains(&alpha)) {
        return Err(FitError::InvalidAlpha(alpha));
    }

    let yf: Vec<f64> = y.iter().map(|&v| f64::from(v)).collect();
    let ybar = mean(&yf);
    if ybar <= 0.0 || ybar >= 1.0 {
        return Err(FitError::SingleClass);
    }

    let scaled = Standardized::new(x);
    let residual0: Vec<f64> = yf.iter().map(|v| v - ybar).collect();

    let generated = lambdas.is_none();
    let lambdas = match lambdas {
        Some(l) => validate_lambdas(l)?,
        None => {
            let ratio = opts.lambda_min_ratio.unwrap_or_else(|| default_min_ratio(n, p));
            let max = lambda_max(&scaled.columns, &residual0, alpha);
            lambda_sequence(max, opts.n_lambda, ratio)?
        }
    };

    let null_deviance = -2.0
        * yf.iter()
            .map(|&yi| yi * ybar.ln() + (1.0 - yi) * (1.0 - ybar).ln())
            .sum::<f64>();

    let mut state = SolverState {
        b0: logit(ybar),
        beta: vec![0.0; p],
        eta: vec![logit(ybar); n],
    };

    let mut path = RegularizationPath {
        alpha,
        lambdas: Vec::with_capacity(lambdas.len()),
        intercepts: Vec::with_capacity(lambdas.len()),
        betas: Vec::with_capacity(lambdas.len()),
        dev_ratio: Vec::with_capacity(lambdas.len()),
        null_deviance,
    };

    for (k, &lambda) in lambdas.iter().enumerate() {
        // The null model is the exact solution at a generated lambda_max.
        if !(generated && k == 0) {
            solve_lambda(&scaled, &yf, alpha, lambda, opts, &mut state)?;
        }

        let deviance = -2.0
            * yf.iter()
                .zip(&state.eta)
                .map(|(&yi, &eta)| bernoulli_log_likelihood(yi, eta))
                .sum::<f64>();
        if !deviance.is_finite() || state.beta.iter().any(|b| !b.is_finite()) || !state.b0.is_finite() {
            return Err(FitError::NonFinite { lambda });
        }
        let ratio = 1.0 - deviance / null_deviance;

        let (b0, beta) = scaled.unscale(state.b0, &state.beta);
        path.lambdas.push(lambda);
        path.intercepts.push(b0);
        path.betas.push(beta);
        path.dev_ratio.push(ratio);

        if generated && k + 1 >= MIN_LAMBDAS_BEFORE_STOP {
            let prev = path.dev_ratio[k - 1];
            if ratio > DEV_RATIO_MAX || ratio - prev < DEV_CHANGE_MIN * ratio {
                debug!(alpha, lambdas = path.len(), dev_ratio = ratio, "path stopped early");
                break;
            }
        }
    }

    Ok(path)
}

fn validate_lambdas(lambdas: &[f64]) -> Result<Vec<f64>, FitError> {
    if lambdas.is_empty() {
        return Err(FitError::InvalidGrid("empty lambda sequence".to_string()));
    }
    if lambdas.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
        return Err(FitError::InvalidGrid("lambdas must be finite and > 0".to_string()));
    }
    if lambdas.windows(2).any(|w| w[1] >= w[0]) {
        return Err(FitError::InvalidGrid("lambdas must be strictly decreasing".to_string()));
    }
    Ok(lambdas.to_vec())
}

/// Column-standardized copy of the design matrix.
struct Standardized {
    /// Standardized columns; constant columns are all zeros.
    columns: Vec<Vec<f64>>,
    means: Vec<f64>,
    /// Zero marks a constant column whose coefficient stays at zero.
    sds: Vec<f64>,
}

impl Standardized {
    fn new(x: &DMatrix<f64>) -> Self {
        let n = x.nrows();
        let p = x.ncols();
        let mut columns = Vec::with_capacity(p);
        let mut means = Vec::with_capacity(p);
        let mut sds = Vec::with_capacity(p);

        for j in 0..p {
            let col: Vec<f64> = x.column(j).iter().copied().collect();
            let m = mean(&col);
            let s = population_sd(&col, m);
            if s.is_finite() && s > 1e-12 {
                columns.push(col.iter().map(|v| (v - m) / s).collect());
                sds.push(s);
            } else {
                columns.push(vec![0.0; n]);
                sds.push(0.0);
            }
            means.push(m);
        }

        Self { columns, means, sds }
    }

    /// Map standardized coefficients back to the caller's scale.
    fn unscale(&self, b0: f64, beta: &[f64]) -> (f64, DVector<f64>) {
        let mut out = DVector::zeros(beta.len());
        let mut intercept = b0;
        for j in 0..beta.len() {
            if self.sds[j] > 0.0 && beta[j] != 0.0 {
                let b = beta[j] / self.sds[j];
                out[j] = b;
                intercept -= b * self.means[j];
            }
        }
        (intercept, out)
    }
}

struct SolverState {
    b0: f64,
    /// Standardized-scale coefficients.
    beta: Vec<f64>,
    /// Linear predictor for every row.
    eta: Vec<f64>,
}

/// IRLS + coordinate descent for one lambda, warm-started from `state`.
fn solve_lambda(
    scaled: &Standardized,
    y: &[f64],
    alpha: f64,
    lambda: f64,
    opts: &PathOptions,
    state: &mut SolverState,
) -> Result<(), FitError> {
    let n = y.len();
    let nf = n as f64;
    let p = state.beta.len();
    let l1 = lambda * alpha;
    let l2 = lambda * (1.0 - alpha);

    let mut w = vec![0.0; n];
    let mut r = vec![0.0; n];
    let mut xv = vec![0.0; p];
    let mut passes = 0usize;

    for _ in 0..opts.max_iter {
        // Quadratic approximation at the current linear predictor.
        for i in 0..n {
            let pi = sigmoid(state.eta[i]);
            let wi = (pi * (1.0 - pi)).max(WEIGHT_FLOOR);
            w[i] = wi;
            r[i] = (y[i] - pi) / wi;
        }
        let sw = w.iter().sum::<f64>() / nf;
        for (j, col) in scaled.columns.iter().enumerate() {
            xv[j] = if scaled.sds[j] > 0.0 {
                col.iter().zip(&w).map(|(x, wi)| wi * x * x).sum::<f64>() / nf
            } else {
                0.0
            };
        }

        let b0_start = state.b0;
        let beta_start = state.beta.clone();
        let pass = CoordinatePass {
            columns: &scaled.columns,
            w: &w,
            xv: &xv,
            sw,
            l1,
            l2,
        };

        loop {
            let dlx = pass.run(&mut r, &mut state.b0, &mut state.beta, false);
            passes += 1;
            if dlx < opts.tol {
                break;
            }
            loop {
                let dlx = pass.run(&mut r, &mut state.b0, &mut state.beta, true);
                passes += 1;
                if dlx < opts.tol {
                    break;
                }
                if passes > opts.max_passes {
                    return Err(FitError::NoConvergence {
                        lambda,
                        iterations: passes,
                    });
                }
            }
            if passes > opts.max_passes {
                return Err(FitError::NoConvergence {
                    lambda,
                    iterations: passes,
                });
            }
        }

        for i in 0..n {
            let mut eta = state.b0;
            for (j, col) in scaled.columns.iter().enumerate() {
                if state.beta[j] != 0.0 {
                    eta += col[i] * state.beta[j];
                }
            }
            state.eta[i] = eta;
        }

        let mut change = sw * (state.b0 - b0_start).powi(2);
        for j in 0..p {
            change = change.max(xv[j] * (state.beta[j] - beta_start[j]).powi(2));
        }
        if change < opts.tol {
            return Ok(());
        }
    }

    Err(FitError::NoConvergence {
        lambda,
        iterations: opts.max_iter,
    })
}

/// One weighted least-squares problem solved by coordinate descent.
struct CoordinatePass<'a> {
    columns: &'a [Vec<f64>],
    w: &'a [f64],
    /// Weighted column second moments.
    xv: &'a [f64],
    /// Mean weight.
    sw: f64,
    l1: f64,
    l2: f64,
}

impl CoordinatePass<'_> {
    /// Update the intercept and every (or every nonzero) coefficient once.
    ///
    /// `r` is the working residual and is kept in sync with the updates.
    /// Returns the largest weighted squared change.
    fn run(&self, r: &mut [f64], b0: &mut f64, beta: &mut [f64], active_only: bool) -> f64 {
        let nf = r.len() as f64;
        let mut dlx = 0.0_f64;

        let d = self.w.iter().zip(r.iter()).map(|(wi, ri)| wi * ri).sum::<f64>() / (nf * self.sw);
        if d != 0.0 {
            *b0 += d;
            for ri in r.iter_mut() {
                *ri -= d;
            }
            dlx = dlx.max(self.sw * d * d);
        }

        for (j, col) in self.columns.iter().enumerate() {
            if self.xv[j] == 0.0 || (active_only && beta[j] == 0.0) {
                continue;
            }
            let old = beta[j];
            let g = col
                .iter()
                .zip(self.w)
                .zip(r.iter())
                .map(|((x, wi), ri)| x * wi * ri)
                .sum::<f64>()
                / nf;
            let new = soft_threshold(g + self.xv[j] * old, self.l1) / (self.xv[j] + self.l2);
            if new != old {
                let diff = new - old;
                for (ri, x) in r.iter_mut().zip(col) {
                    *ri -= diff * x;
                }
                beta[j] = new;
                dlx = dlx.max(self.xv[j] * diff * diff);
            }
        }

        dlx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::testutil::synthetic_problem;
    use approx::assert_abs_diff_eq;

    fn precise() -> PathOptions {
        PathOptions {
            n_lambda: 30,
            tol: 1e-12,
            ..PathOptions::default()
        }
    }

    #[test]
    fn first_lambda_zeroes_every_coefficient() {
        let (x, y) = synthetic_problem(200, 6, 11);
        let path = fit_path(&x, &y, 1.0, None, &precise()).unwrap();
        assert_eq!(path.nonzero(0), 0);
        let ybar = y.iter().map(|&v| f64::from(v)).sum::<f64>() / y.len() as f64;
        assert_abs_diff_eq!(path.intercepts[0], logit(ybar), epsilon = 1e-8);
        assert_abs_diff_eq!(path.dev_ratio[0], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn lasso_path_grows_and_explains_more_deviance() {
        let (x, y) = synthetic_problem(200, 6, 12);
        let path = fit_path(&x, &y, 1.0, None, &precise()).unwrap();
        assert!(path.len() >= MIN_LAMBDAS_BEFORE_STOP);
        assert!(path.lambdas.windows(2).all(|w| w[0] > w[1]));
        let last = path.len() - 1;
        assert!(path.nonzero(last) >= 3);
        assert!(path.dev_ratio[last] > path.dev_ratio[0]);
        for w in path.dev_ratio.windows(2) {
            assert!(w[1] >= w[0] - 1e-9);
        }
    }

    #[test]
    fn solution_satisfies_stationarity_conditions() {
        let (x, y) = synthetic_problem(150, 5, 13);
        let alpha = 0.5;
        let lambdas = [0.05, 0.02];
        let path = fit_path(&x, &y, alpha, Some(&lambdas[..]), &precise()).unwrap();

        // Re-derive the standardized problem and check the KKT conditions.
        let scaled = Standardized::new(&x);
        let idx = 1;
        let lambda = lambdas[idx];
        let probs = path.predict_at(&x, idx);
        let n = y.len() as f64;
        for j in 0..x.ncols() {
            let grad: f64 = scaled.columns[j]
                .iter()
                .zip(&y)
                .zip(&probs)
                .map(|((xij, &yi), pi)| xij * (f64::from(yi) - pi))
                .sum::<f64>()
                / n;
            let b_std = path.betas[idx][j] * scaled.sds[j];
            if b_std != 0.0 {
                let expected = lambda * alpha * b_std.signum() + lambda * (1.0 - alpha) * b_std;
                assert_abs_diff_eq!(grad, expected, epsilon = 1e-5);
            } else {
                assert!(grad.abs() <= lambda * alpha + 1e-5);
            }
        }
        // Intercept is unpenalized: residuals sum to zero.
        let resid: f64 = y.iter().zip(&probs).map(|(&yi, p)| f64::from(yi) - p).sum();
        assert_abs_diff_eq!(resid / n, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn ridge_end_keeps_every_coefficient() {
        let (x, y) = synthetic_problem(120, 4, 14);
        let path = fit_path(&x, &y, 0.0, None, &precise()).unwrap();
        let last = path.len() - 1;
        assert_eq!(path.nonzero(last), 4);
    }

    #[test]
    fn supplied_lambdas_are_fitted_in_full() {
        let (x, y) = synthetic_problem(100, 4, 15);
        let generated = fit_path(&x, &y, 0.7, None, &precise()).unwrap();
        let refit = fit_path(&x, &y, 0.7, Some(generated.lambdas.as_slice()), &precise()).unwrap();
        assert_eq!(refit.lambdas, generated.lambdas);
    }

    #[test]
    fn fitting_is_deterministic() {
        let (x, y) = synthetic_problem(100, 5, 16);
        let a = fit_path(&x, &y, 0.3, None, &PathOptions::default()).unwrap();
        let b = fit_path(&x, &y, 0.3, None, &PathOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn interpolates_between_path_lambdas() {
        let (x, y) = synthetic_problem(100, 3, 17);
        let path = fit_path(&x, &y, 1.0, Some(&[0.1, 0.01][..]), &precise()).unwrap();
        let (b0, beta) = path.coefficients_at(0.055);
        assert_abs_diff_eq!(b0, 0.5 * (path.intercepts[0] + path.intercepts[1]), epsilon = 1e-12);
        for j in 0..3 {
            assert_abs_diff_eq!(beta[j], 0.5 * (path.betas[0][j] + path.betas[1][j]), epsilon = 1e-12);
        }
        let (b0_hi, _) = path.coefficients_at(5.0);
        assert_eq!(b0_hi, path.intercepts[0]);
        let exact = path.predict(&x, 0.01);
        assert_eq!(exact, path.predict_at(&x, 1));
    }

    #[test]
    fn rejects_invalid_inputs() {
        let (x, y) = synthetic_problem(50, 3, 18);
        let opts = PathOptions::default();
        assert_eq!(fit_path(&x, &y, 1.5, None, &opts).unwrap_err(), FitError::InvalidAlpha(1.5));
        assert_eq!(
            fit_path(&x, &y[..10], 1.0, None, &opts).unwrap_err(),
            FitError::DimensionMismatch { rows: 50, labels: 10 }
        );
        let ones = vec![1u8; 50];
        assert_eq!(fit_path(&x, &ones, 1.0, None, &opts).unwrap_err(), FitError::SingleClass);
        assert!(matches!(
            fit_path(&x, &y, 1.0, Some(&[0.1, 0.2][..]), &opts).unwrap_err(),
            FitError::InvalidGrid(_)
        ));
    }

    #[test]
    fn constant_columns_stay_at_zero() {
        let (mut x, y) = synthetic_problem(80, 3, 19);
        x.column_mut(1).fill(2.5);
        let path = fit_path(&x, &y, 0.5, None, &precise()).unwrap();
        assert!(path.betas.iter().all(|b| b[1] == 0.0));
    }

    #[test]
    fn starved_solver_reports_non_convergence() {
        let (x, y) = synthetic_problem(100, 4, 20);
        let opts = PathOptions {
            max_iter: 1,
            tol: 1e-14,
            ..PathOptions::default()
        };
        let err = fit_path(&x, &y, 1.0, Some(&[0.001][..]), &opts).unwrap_err();
        assert!(matches!(err, FitError::NoConvergence { .. }));
    }
}
