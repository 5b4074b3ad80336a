//! Design-matrix construction.
//!
//! Turns a loaded `Dataset` into:
//! - a standardized numeric design matrix (`DesignMatrix`)
//! - a label vector in `{0,1}` (1 = bad)
//!
//! Categorical columns use treatment coding: levels are sorted, the first one
//! is the reference level and every other level becomes an indicator column
//! named `<column><level>`. There is no intercept column; the model fits its own.

use std::collections::{BTreeSet, HashSet};

use nalgebra::DMatrix;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Dataset;

#[derive(Debug, Error, PartialEq)]
pub enum FeatureBuildError {
    #[error("column `{column}` line {line}: cannot coerce `{value}` to a number")]
    NonNumeric { column: String, line: usize, value: String },

    #[error("column `{column}` has zero or undefined variance and cannot be standardized")]
    ZeroVariance { column: String },

    #[error("column `{0}` is not part of the dataset")]
    UnknownColumn(String),

    #[error("column `{0}` is forced both numeric and categorical")]
    ConflictingKind(String),

    #[error("no feature columns remain after expansion")]
    NoFeatures,
}

/// Forced column kinds (everything else is inferred).
#[derive(Debug, Clone, Default)]
pub struct FeatureOptions {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    /// Sorted levels; the first is the reference level.
    Categorical(Vec<String>),
}

/// Standardized feature matrix with column names.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    pub matrix: DMatrix<f64>,
    pub columns: Vec<String>,
}

impl DesignMatrix {
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Copy the given rows (in the given order) into a new matrix.
    pub fn select_rows(&self, rows: &[usize]) -> DesignMatrix {
        DesignMatrix {
            matrix: self.matrix.select_rows(rows.iter()),
            columns: self.columns.clone(),
        }
    }
}

/// Builder output.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub x: DesignMatrix,
    pub y: Vec<u8>,
    /// Resolved kind of every source column, in dataset order.
    pub kinds: Vec<(String, ColumnKind)>,
}

/// Build the standardized design matrix and label vector.
pub fn build_features(dataset: &Dataset, opts: &FeatureOptions) -> Result<FeatureSet, FeatureBuildError> {
    let known: HashSet<String> = dataset.columns.iter().map(|c| c.to_ascii_lowercase()).collect();
    let forced_numeric = normalize_names(&opts.numeric, &known)?;
    let forced_categorical = normalize_names(&opts.categorical, &known)?;
    if let Some(name) = forced_numeric.intersection(&forced_categorical).next() {
        return Err(FeatureBuildError::ConflictingKind(name.clone()));
    }

    let n = dataset.len();
    let mut names = Vec::new();
    let mut data: Vec<Vec<f64>> = Vec::new();
    let mut kinds = Vec::with_capacity(dataset.columns.len());

    for (j, column) in dataset.columns.iter().enumerate() {
        let key = column.to_ascii_lowercase();
        let kind = if forced_categorical.contains(&key) {
            categorical_kind(dataset, j)
        } else if forced_numeric.contains(&key) {
            ColumnKind::Numeric
        } else {
            infer_kind(dataset, j)
        };

        match &kind {
            ColumnKind::Numeric => {
                let mut values = Vec::with_capacity(n);
                for row in &dataset.rows {
                    let raw = &row.values[j];
                    let v = parse_finite(raw).ok_or_else(|| FeatureBuildError::NonNumeric {
                        column: column.clone(),
                        line: row.line,
                        value: raw.clone(),
                    })?;
                    values.push(v);
                }
                names.push(column.clone());
                data.push(values);
            }
            ColumnKind::Categorical(levels) => {
                if levels.len() < 2 {
                    warn!(column = %column, "categorical column has a single level; no indicators produced");
                }
                for level in levels.iter().skip(1) {
                    let values = dataset
                        .rows
                        .iter()
                        .map(|row| if row.values[j] == *level { 1.0 } else { 0.0 })
                        .collect();
                    names.push(format!("{column}{level}"));
                    data.push(values);
                }
            }
        }
        kinds.push((column.clone(), kind));
    }

    if names.is_empty() {
        return Err(FeatureBuildError::NoFeatures);
    }

    for (name, values) in names.iter().zip(data.iter_mut()) {
        standardize(values).ok_or_else(|| FeatureBuildError::ZeroVariance { column: name.clone() })?;
    }

    let p = names.len();
    let matrix = DMatrix::from_fn(n, p, |i, j| data[j][i]);
    debug!(rows = n, cols = p, "design matrix assembled");
    info!(
        source_columns = dataset.columns.len(),
        features = p,
        "built standardized design matrix"
    );

    Ok(FeatureSet {
        x: DesignMatrix { matrix, columns: names },
        y: dataset.label_indicators(),
        kinds,
    })
}

fn normalize_names(names: &[String], known: &HashSet<String>) -> Result<HashSet<String>, FeatureBuildError> {
    names
        .iter()
        .map(|name| {
            let key = name.trim().to_ascii_lowercase();
            if known.contains(&key) {
                Ok(key)
            } else {
                Err(FeatureBuildError::UnknownColumn(name.clone()))
            }
        })
        .collect()
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn infer_kind(dataset: &Dataset, j: usize) -> ColumnKind {
    if dataset.rows.iter().all(|row| parse_finite(&row.values[j]).is_some()) {
        ColumnKind::Numeric
    } else {
        categorical_kind(dataset, j)
    }
}

fn categorical_kind(dataset: &Dataset, j: usize) -> ColumnKind {
    let levels: BTreeSet<&str> = dataset.rows.iter().map(|row| row.values[j].as_str()).collect();
    ColumnKind::Categorical(levels.into_iter().map(str::to_string).collect())
}

/// Center and scale in place using the sample standard deviation.
///
/// Returns `None` when the column cannot be scaled.
fn standardize(values: &mut [f64]) -> Option<()> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n as f64 - 1.0);
    let sd = var.sqrt();
    if !(sd.is_finite() && sd > 1e-12) {
        return None;
    }
    for v in values.iter_mut() {
        *v = (*v - mean) / sd;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetRow, Label};
    use approx::assert_abs_diff_eq;

    fn dataset(columns: &[&str], rows: &[(&[&str], Label)]) -> Dataset {
        Dataset {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, (values, label))| DatasetRow {
                    line: i + 2,
                    values: values.iter().map(|v| v.to_string()).collect(),
                    label: *label,
                })
                .collect(),
        }
    }

    #[test]
    fn expands_categoricals_and_standardizes() {
        let ds = dataset(
            &["housing", "age"],
            &[
                (&["own", "20"], Label::Good),
                (&["rent", "30"], Label::Bad),
                (&["free", "40"], Label::Good),
                (&["own", "50"], Label::Bad),
            ],
        );
        let fs = build_features(&ds, &FeatureOptions::default()).unwrap();

        // "free" is the reference level.
        assert_eq!(fs.x.columns, vec!["housingown", "housingrent", "age"]);
        assert_eq!(fs.y, vec![0, 1, 0, 1]);
        assert_eq!(fs.x.nrows(), 4);

        for j in 0..fs.x.ncols() {
            let col = fs.x.matrix.column(j);
            let mean = col.iter().sum::<f64>() / 4.0;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);
        }
        assert!(matches!(fs.kinds[0].1, ColumnKind::Categorical(ref l) if l.len() == 3));
        assert_eq!(fs.kinds[1].1, ColumnKind::Numeric);
    }

    #[test]
    fn forced_numeric_column_reports_offending_cell() {
        let ds = dataset(&["amount"], &[(&["10"], Label::Good), (&["n/a"], Label::Bad)]);
        let opts = FeatureOptions {
            numeric: vec!["amount".to_string()],
            ..FeatureOptions::default()
        };
        let err = build_features(&ds, &opts).unwrap_err();
        assert_eq!(
            err,
            FeatureBuildError::NonNumeric {
                column: "amount".to_string(),
                line: 3,
                value: "n/a".to_string(),
            }
        );
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn forced_categorical_expands_integer_codes() {
        let ds = dataset(
            &["rate"],
            &[(&["1"], Label::Good), (&["2"], Label::Bad), (&["3"], Label::Good)],
        );
        let opts = FeatureOptions {
            categorical: vec!["RATE".to_string()],
            ..FeatureOptions::default()
        };
        let fs = build_features(&ds, &opts).unwrap();
        assert_eq!(fs.x.columns, vec!["rate2", "rate3"]);
    }

    #[test]
    fn constant_column_cannot_be_standardized() {
        let ds = dataset(&["flat"], &[(&["1"], Label::Good), (&["1"], Label::Bad)]);
        let err = build_features(&ds, &FeatureOptions::default()).unwrap_err();
        assert_eq!(err, FeatureBuildError::ZeroVariance { column: "flat".to_string() });
    }

    #[test]
    fn single_level_categorical_yields_no_features() {
        let ds = dataset(&["only"], &[(&["x"], Label::Good), (&["x"], Label::Bad)]);
        let err = build_features(&ds, &FeatureOptions::default()).unwrap_err();
        assert_eq!(err, FeatureBuildError::NoFeatures);
    }

    #[test]
    fn unknown_and_conflicting_forced_columns_fail() {
        let ds = dataset(&["a"], &[(&["1"], Label::Good), (&["2"], Label::Bad)]);
        let opts = FeatureOptions {
            numeric: vec!["b".to_string()],
            ..FeatureOptions::default()
        };
        assert_eq!(
            build_features(&ds, &opts).unwrap_err(),
            FeatureBuildError::UnknownColumn("b".to_string())
        );

        let opts = FeatureOptions {
            numeric: vec!["a".to_string()],
            categorical: vec!["a".to_string()],
        };
        assert_eq!(
            build_features(&ds, &opts).unwrap_err(),
            FeatureBuildError::ConflictingKind("a".to_string())
        );
    }

    #[test]
    fn select_rows_keeps_order_and_names() {
        let ds = dataset(
            &["v"],
            &[(&["1"], Label::Good), (&["2"], Label::Bad), (&["3"], Label::Good)],
        );
        let fs = build_features(&ds, &FeatureOptions::default()).unwrap();
        let sub = fs.x.select_rows(&[2, 0]);
        assert_eq!(sub.nrows(), 2);
        assert_eq!(sub.columns, fs.x.columns);
        assert_eq!(sub.matrix[(0, 0)], fs.x.matrix[(2, 0)]);
        assert_eq!(sub.matrix[(1, 0)], fs.x.matrix[(0, 0)]);
    }
}
