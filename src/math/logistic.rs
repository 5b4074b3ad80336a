//! Logistic link helpers.
//!
//! Numerical notes:
//! - `sigmoid` branches on the sign of `eta` so `exp` never overflows.
//! - `softplus(eta) = ln(1 + e^eta)` uses `ln_1p` on the small side, which keeps
//!   the Bernoulli log-likelihood exact for large `|eta|` without clamping.

/// Logistic function `1 / (1 + e^-eta)`.
pub fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

/// Log-odds of `p`.
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// `ln(1 + e^eta)`.
pub fn softplus(eta: f64) -> f64 {
    if eta > 0.0 {
        eta + (-eta).exp().ln_1p()
    } else {
        eta.exp().ln_1p()
    }
}

/// Bernoulli log-likelihood of a 0/1 outcome given the linear predictor.
pub fn bernoulli_log_likelihood(y: f64, eta: f64) -> f64 {
    y * eta - softplus(eta)
}
