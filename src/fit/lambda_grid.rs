//! Mixing grid and regularization-strength sequences.
//!
//! - The mixing grid is evenly spaced on `[0, 1]` and computed from integer
//!   indices, so the endpoints are exactly `0.0` and `1.0`.
//! - For a fixed alpha, lambdas are log-spaced from `lambda_max` (the smallest
//!   value at which every penalized coefficient is zero) down to
//!   `lambda_max * min_ratio`, in decreasing order so the path can warm-start.

use crate::fit::FitError;

/// Ridge-end floor used when computing `lambda_max` for `alpha = 0`.
pub const ALPHA_FLOOR: f64 = 1e-3;

/// Default number of lambdas per path.
pub const DEFAULT_N_LAMBDA: usize = 100;

/// Evenly spaced mixing coefficients on `[0, 1]` (inclusive).
///
/// `steps = 21` gives `{0.00, 0.05, ..., 1.00}`.
pub fn alpha_grid(steps: usize) -> Result<Vec<f64>, FitError> {
    if steps < 2 {
        return Err(FitError::InvalidGrid(format!("alpha steps must be >= 2, got {steps}")));
    }
    let denom = (steps - 1) as f64;
    Ok((0..steps).map(|i| i as f64 / denom).collect())
}

/// Generate `steps` log-spaced points from `max` down to `min` (inclusive).
pub fn log_space_desc(max: f64, min: f64, steps: usize) -> Result<Vec<f64>, FitError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > min) {
        return Err(FitError::InvalidGrid(format!(
            "lambda range min={min}, max={max} (must be finite, >0, and max>min)"
        )));
    }
    if steps < 2 {
        return Err(FitError::InvalidGrid("lambda steps must be >= 2".to_string()));
    }

    let ln_max = max.ln();
    let ln_min = min.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_max - step * i as f64).exp());
    }
    // Pin the endpoints exactly.
    out[0] = max;
    out[steps - 1] = min;
    Ok(out)
}

/// Default smallest-lambda ratio: `1e-4` when `n >= p`, `1e-2` otherwise.
pub fn default_min_ratio(n: usize, p: usize) -> f64 {
    if n >= p { 1e-4 } else { 1e-2 }
}

/// Smallest lambda that zeroes every penalized coefficient.
///
/// `columns` must be standardized (population sd) and `residual` is `y - ybar`.
pub fn lambda_max(columns: &[Vec<f64>], residual: &[f64], alpha: f64) -> f64 {
    let n = residual.len() as f64;
    let alpha = alpha.max(ALPHA_FLOOR);
    columns
        .iter()
        .map(|col| col.iter().zip(residual).map(|(x, r)| x * r).sum::<f64>().abs())
        .fold(0.0_f64, f64::max)
        / (n * alpha)
}

/// Full decreasing lambda sequence.
pub fn lambda_sequence(lambda_max: f64, n_lambda: usize, min_ratio: f64) -> Result<Vec<f64>, FitError> {
    if !(min_ratio.is_finite() && min_ratio > 0.0 && min_ratio < 1.0) {
        return Err(FitError::InvalidGrid(format!(
            "lambda min ratio must be in (0, 1), got {min_ratio}"
        )));
    }
    log_space_desc(lambda_max, lambda_max * min_ratio, n_lambda)
}
