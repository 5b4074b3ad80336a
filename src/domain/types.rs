//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during the sweep and evaluation
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Binary credit outcome.
///
/// `Bad` is the positive class (a default) and is encoded as `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Good,
    Bad,
}

impl Label {
    /// `1` for `Bad`, `0` for `Good`.
    pub fn indicator(self) -> u8 {
        match self {
            Label::Good => 0,
            Label::Bad => 1,
        }
    }

    pub fn from_indicator(value: u8) -> Self {
        if value == 0 { Label::Good } else { Label::Bad }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Label::Good => "good",
            Label::Bad => "bad",
        }
    }
}

/// A single loaded dataset row.
///
/// `values` holds one raw cell per feature column (same order as
/// `Dataset::columns`). Typing happens in the feature builder.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    pub values: Vec<String>,
    pub label: Label,
}

/// Immutable dataset: feature column names plus labelled rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Label vector in `{0,1}` (1 = bad), in row order.
    pub fn label_indicators(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.label.indicator()).collect()
    }
}

/// How the regularization strength is picked from a cross-validated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionRule {
    /// Lambda minimizing mean cross-validated deviance.
    #[serde(rename = "lambda.min")]
    MinError,
    /// Largest lambda within one standard error of the minimum.
    #[serde(rename = "lambda.1se")]
    MinErrorPlusOneStdErr,
}

impl SelectionRule {
    pub const ALL: [SelectionRule; 2] = [SelectionRule::MinError, SelectionRule::MinErrorPlusOneStdErr];

    pub fn display_name(self) -> &'static str {
        match self {
            SelectionRule::MinError => "lambda.min",
            SelectionRule::MinErrorPlusOneStdErr => "lambda.1se",
        }
    }
}

/// Which partition a record was scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSplit {
    Train,
    Test,
}

impl DataSplit {
    pub fn display_name(self) -> &'static str {
        match self {
            DataSplit::Train => "train",
            DataSplit::Test => "test",
        }
    }
}

/// One scored (alpha, rule, split) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub alpha: f64,
    pub rule: SelectionRule,
    pub split: DataSplit,
    /// Regularization strength picked by `rule`.
    pub lambda: f64,
    /// Nonzero coefficients (intercept excluded) at `lambda`.
    pub nonzero: usize,
    /// Predicted probability of `bad`, one per scored row.
    pub predictions: Vec<f64>,
    pub deviance: f64,
}

/// A mixing coefficient whose cross-validated fit failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFailure {
    pub alpha: f64,
    pub message: String,
}

/// A record that could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalFailure {
    pub alpha: f64,
    pub rule: SelectionRule,
    pub split: DataSplit,
    pub message: String,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_path: PathBuf,

    /// Name of the outcome column.
    pub label_column: String,
    /// Outcome value mapped to `Label::Bad`.
    pub positive_label: String,
    /// Outcome value mapped to `Label::Good`.
    pub negative_label: String,
    /// Columns excluded from the feature set (e.g. row ids).
    pub drop_columns: Vec<String>,
    /// Columns that must parse as numbers.
    pub numeric_columns: Vec<String>,
    /// Columns always expanded into indicators, even if they look numeric.
    pub categorical_columns: Vec<String>,

    pub train_fraction: f64,
    /// Seed for the stratified train/test split.
    pub seed: u64,
    /// Seed for the stratified fold assignment.
    pub fold_seed: u64,
    pub n_folds: usize,

    /// Number of points in the mixing grid (21 gives a 0.05 step).
    pub alpha_steps: usize,
    pub n_lambda: usize,
    /// Overrides the data-dependent smallest-lambda ratio when set.
    pub lambda_min_ratio: Option<f64>,
    pub tol: f64,
    pub max_iter: usize,
    /// Worker threads for the sweep (`None` = rayon default).
    pub threads: Option<usize>,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl PipelineConfig {
    /// Defaults matching the CLI for everything but the data path and seed.
    pub fn with_defaults(data_path: PathBuf, seed: u64) -> Self {
        Self {
            data_path,
            label_column: "default".to_string(),
            positive_label: "bad".to_string(),
            negative_label: "good".to_string(),
            drop_columns: Vec::new(),
            numeric_columns: Vec::new(),
            categorical_columns: Vec::new(),
            train_fraction: 0.8,
            seed,
            fold_seed: seed,
            n_folds: 10,
            alpha_steps: 21,
            n_lambda: 100,
            lambda_min_ratio: None,
            tol: 1e-7,
            max_iter: 100,
            threads: None,
            plot: true,
            plot_width: 80,
            plot_height: 20,
            export_results: None,
            export_json: None,
        }
    }

    /// Reject settings no stage could run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.train_fraction.is_finite() && self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(AppError::new(
                2,
                format!("Train fraction must be in (0, 1), got {}.", self.train_fraction),
            ));
        }
        if self.n_folds < 2 {
            return Err(AppError::new(2, format!("At least 2 folds are required, got {}.", self.n_folds)));
        }
        if self.alpha_steps < 2 {
            return Err(AppError::new(2, format!("Alpha steps must be >= 2, got {}.", self.alpha_steps)));
        }
        if self.n_lambda < 2 {
            return Err(AppError::new(2, format!("Lambda count must be >= 2, got {}.", self.n_lambda)));
        }
        if let Some(ratio) = self.lambda_min_ratio {
            if !(ratio.is_finite() && ratio > 0.0 && ratio < 1.0) {
                return Err(AppError::new(2, format!("Lambda min ratio must be in (0, 1), got {ratio}.")));
            }
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(AppError::new(2, format!("Tolerance must be > 0, got {}.", self.tol)));
        }
        if self.max_iter == 0 {
            return Err(AppError::new(2, "Max iterations must be > 0."));
        }
        if self.threads == Some(0) {
            return Err(AppError::new(2, "Thread count must be > 0."));
        }
        Ok(())
    }
}

/// A saved results file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub fold_seed: u64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub features: Vec<String>,
    pub best_alpha: f64,
    pub training: Vec<ResultRecord>,
    pub test: Vec<ResultRecord>,
    pub fit_failures: Vec<FitFailure>,
    pub eval_failures: Vec<EvalFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_indicator_round_trips() {
        assert_eq!(Label::Bad.indicator(), 1);
        assert_eq!(Label::Good.indicator(), 0);
        assert_eq!(Label::from_indicator(1), Label::Bad);
        assert_eq!(Label::from_indicator(0), Label::Good);
    }

    #[test]
    fn selection_rule_serializes_with_conventional_names() {
        let json = serde_json::to_string(&SelectionRule::MinErrorPlusOneStdErr).unwrap();
        assert_eq!(json, "\"lambda.1se\"");
        let rule: SelectionRule = serde_json::from_str("\"lambda.min\"").unwrap();
        assert_eq!(rule, SelectionRule::MinError);
    }

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::with_defaults(PathBuf::from("credit.csv"), 42);
        assert!(config.validate().is_ok());
        assert_eq!(config.fold_seed, 42);
    }

    #[test]
    fn validation_rejects_unusable_settings() {
        let base = PipelineConfig::with_defaults(PathBuf::from("credit.csv"), 1);
        let cases = [
            PipelineConfig { train_fraction: 0.0, ..base.clone() },
            PipelineConfig { n_folds: 1, ..base.clone() },
            PipelineConfig { alpha_steps: 1, ..base.clone() },
            PipelineConfig { lambda_min_ratio: Some(2.0), ..base.clone() },
            PipelineConfig { tol: -1.0, ..base.clone() },
            PipelineConfig { threads: Some(0), ..base.clone() },
        ];
        for config in cases {
            assert_eq!(config.validate().unwrap_err().exit_code(), 2);
        }
    }
}
