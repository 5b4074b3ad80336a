//! Binomial deviance of probability estimates against 0/1 outcomes.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DevianceError {
    #[error("{predictions} predictions but {actuals} outcomes")]
    LengthMismatch { predictions: usize, actuals: usize },

    #[error("no rows to score")]
    Empty,

    #[error("row {row}: probability {probability} is invalid for outcome {actual}")]
    InvalidProbability { row: usize, probability: f64, actual: u8 },

    #[error("row {row}: outcome must be 0 or 1, got {actual}")]
    InvalidActual { row: usize, actual: u8 },
}

/// Mean binomial deviance over rows.
///
/// Per row: `2 * (a*ln(a/p) + (1-a)*ln((1-a)/(1-p)))`, where each term is taken
/// as zero when its outcome factor is zero. A probability outside `[0, 1]`, or
/// one that makes a live term infinite, is rejected.
pub fn binomial_deviance(probs: &[f64], actual: &[u8]) -> Result<f64, DevianceError> {
    if probs.len() != actual.len() {
        return Err(DevianceError::LengthMismatch {
            predictions: probs.len(),
            actuals: actual.len(),
        });
    }
    if probs.is_empty() {
        return Err(DevianceError::Empty);
    }

    let mut total = 0.0;
    for (row, (&p, &a)) in probs.iter().zip(actual).enumerate() {
        let invalid = DevianceError::InvalidProbability {
            row,
            probability: p,
            actual: a,
        };
        if !(0.0..=1.0).contains(&p) {
            return Err(invalid);
        }
        total += match a {
            1 if p > 0.0 => -2.0 * p.ln(),
            0 if p < 1.0 => -2.0 * (1.0 - p).ln(),
            0 | 1 => return Err(invalid),
            _ => return Err(DevianceError::InvalidActual { row, actual: a }),
        };
    }
    Ok(total / probs.len() as f64)
}
