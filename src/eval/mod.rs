//! Scoring of a finished sweep.
//!
//! - Every successful alpha is scored on the training rows under both
//!   selection rules.
//! - The best alpha is the one with the lowest training deviance under the
//!   one-standard-error rule (first in grid order on ties).
//! - Only the best alpha is scored on the test rows.

pub mod deviance;

pub use deviance::*;

use nalgebra::DMatrix;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{DataSplit, EvalFailure, ResultRecord, SelectionRule};
use crate::fit::{CvFit, SweepOutcome};

/// Rule used to pick the best alpha.
pub const BEST_ALPHA_RULE: SelectionRule = SelectionRule::MinErrorPlusOneStdErr;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("no alpha produced a scorable `{}` training record", BEST_ALPHA_RULE.display_name())]
    NoCandidates,

    #[error("{split} features have {found} columns, expected {expected}")]
    ColumnMismatch {
        split: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Training and test result tables for one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// Rule-major: every alpha under `lambda.min`, then every alpha under `lambda.1se`.
    pub training: Vec<ResultRecord>,
    pub best_alpha: f64,
    /// The best alpha under each rule.
    pub test: Vec<ResultRecord>,
    pub failures: Vec<EvalFailure>,
}

/// Score every successful sweep entry and pick the best alpha.
pub fn evaluate(
    sweep: &SweepOutcome,
    x_train: &DMatrix<f64>,
    y_train: &[u8],
    x_test: &DMatrix<f64>,
    y_test: &[u8],
) -> Result<EvaluationReport, EvalError> {
    let fits: Vec<&CvFit> = sweep.successes().collect();
    if let Some(first) = fits.first() {
        let expected = first.path.betas[0].len();
        check_columns("train", expected, x_train)?;
        check_columns("test", expected, x_test)?;
    }

    let mut training = Vec::with_capacity(fits.len() * SelectionRule::ALL.len());
    let mut failures = Vec::new();

    for rule in SelectionRule::ALL {
        for fit in &fits {
            match score(fit, rule, DataSplit::Train, x_train, y_train) {
                Ok(record) => training.push(record),
                Err(failure) => failures.push(failure),
            }
        }
    }

    let mut best: Option<&ResultRecord> = None;
    for record in training.iter().filter(|r| r.rule == BEST_ALPHA_RULE) {
        if best.is_none_or(|b| record.deviance < b.deviance) {
            best = Some(record);
        }
    }
    let best_alpha = best.ok_or(EvalError::NoCandidates)?.alpha;
    info!(best_alpha, rule = BEST_ALPHA_RULE.display_name(), "best alpha selected");

    let mut test = Vec::with_capacity(SelectionRule::ALL.len());
    if let Some(fit) = fits.iter().find(|f| f.alpha == best_alpha) {
        for rule in SelectionRule::ALL {
            match score(fit, rule, DataSplit::Test, x_test, y_test) {
                Ok(record) => test.push(record),
                Err(failure) => failures.push(failure),
            }
        }
    }

    for f in &failures {
        warn!(
            alpha = f.alpha,
            rule = f.rule.display_name(),
            split = f.split.display_name(),
            error = %f.message,
            "record not scored"
        );
    }

    Ok(EvaluationReport {
        training,
        best_alpha,
        test,
        failures,
    })
}

fn check_columns(split: &'static str, expected: usize, x: &DMatrix<f64>) -> Result<(), EvalError> {
    if x.ncols() != expected {
        return Err(EvalError::ColumnMismatch {
            split,
            expected,
            found: x.ncols(),
        });
    }
    Ok(())
}

fn score(
    fit: &CvFit,
    rule: SelectionRule,
    split: DataSplit,
    x: &DMatrix<f64>,
    y: &[u8],
) -> Result<ResultRecord, EvalFailure> {
    let predictions = fit.predict(x, rule);
    match binomial_deviance(&predictions, y) {
        Ok(deviance) => Ok(ResultRecord {
            alpha: fit.alpha,
            rule,
            split,
            lambda: fit.lambda_for(rule),
            nonzero: fit.nonzero(rule),
            predictions,
            deviance,
        }),
        Err(e) => Err(EvalFailure {
            alpha: fit.alpha,
            rule,
            split,
            message: e.to_string(),
        }),
    }
}
