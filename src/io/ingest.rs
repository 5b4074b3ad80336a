//! CSV ingest.
//!
//! This module is responsible for turning a pre-cleaned credit CSV into a
//! `Dataset`: feature column names plus rows of raw cells and a binary label.
//!
//! Design goals:
//! - **Strict schema** only for the label column (everything else is tolerated)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No typing here**: numeric/categorical decisions belong to `features`

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Dataset, DatasetRow, Label};

/// Errors that abort the load.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to open dataset '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV headers: {0}")]
    Headers(#[source] csv::Error),

    #[error("Missing label column `{0}`")]
    MissingLabelColumn(String),

    #[error("Dropped column `{0}` does not exist")]
    UnknownDropColumn(String),

    #[error("Positive and negative labels must differ (both `{0}`)")]
    AmbiguousLabels(String),

    #[error("No valid rows remain after validation ({rows_read} read)")]
    NoRows { rows_read: usize },
}

/// How to find and interpret the outcome column.
#[derive(Debug, Clone)]
pub struct LabelSpec {
    pub column: String,
    pub positive: String,
    pub negative: String,
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self {
            column: "default".to_string(),
            positive: "bad".to_string(),
            negative: "good".to_string(),
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: dataset + row errors + counters.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a dataset from a CSV file on disk.
pub fn load_dataset(path: &Path, label: &LabelSpec, drop_columns: &[String]) -> Result<LoadedDataset, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = read_dataset(file, label, drop_columns)?;
    info!(
        path = %path.display(),
        rows = loaded.dataset.len(),
        skipped = loaded.row_errors.len(),
        "loaded dataset"
    );
    Ok(loaded)
}

/// Read a dataset from any CSV source (used directly by tests).
pub fn read_dataset<R: Read>(reader: R, label: &LabelSpec, drop_columns: &[String]) -> Result<LoadedDataset, IngestError> {
    let positive = label.positive.trim().to_ascii_lowercase();
    let negative = label.negative.trim().to_ascii_lowercase();
    if positive == negative {
        return Err(IngestError::AmbiguousLabels(positive));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(IngestError::Headers)?.clone();
    let header_map = build_header_map(&headers);

    let label_idx = *header_map
        .get(&normalize_header_name(&label.column))
        .ok_or_else(|| IngestError::MissingLabelColumn(label.column.clone()))?;

    let mut dropped = Vec::with_capacity(drop_columns.len());
    for name in drop_columns {
        let idx = header_map
            .get(&normalize_header_name(name))
            .ok_or_else(|| IngestError::UnknownDropColumn(name.clone()))?;
        dropped.push(*idx);
    }

    // Feature columns keep their original spelling (minus BOM/whitespace).
    let feature_idx: Vec<usize> = (0..headers.len())
        .filter(|i| *i != label_idx && !dropped.contains(i))
        .collect();
    let columns: Vec<String> = feature_idx
        .iter()
        .map(|&i| clean_header_name(&headers[i]).to_string())
        .collect();
    debug!(features = columns.len(), "resolved feature columns");

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, headers.len(), label_idx, &feature_idx, &positive, &negative) {
            Ok((values, label)) => rows.push(DatasetRow { line, values, label }),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), "skipped invalid dataset rows");
    }

    if rows.is_empty() {
        return Err(IngestError::NoRows { rows_read });
    }

    Ok(LoadedDataset {
        dataset: Dataset { columns, rows },
        row_errors,
        rows_read,
    })
}

fn parse_row(
    record: &StringRecord,
    n_columns: usize,
    label_idx: usize,
    feature_idx: &[usize],
    positive: &str,
    negative: &str,
) -> Result<(Vec<String>, Label), String> {
    if record.len() != n_columns {
        return Err(format!("Expected {n_columns} fields, found {}.", record.len()));
    }

    let raw_label = record.get(label_idx).unwrap_or("").to_ascii_lowercase();
    let label = if raw_label == positive {
        Label::Bad
    } else if raw_label == negative {
        Label::Good
    } else {
        return Err(format!(
            "Unrecognized label `{raw_label}` (expected `{positive}` or `{negative}`)."
        ));
    };

    let values = feature_idx
        .iter()
        .map(|&i| record.get(i).unwrap_or("").to_string())
        .collect();

    Ok((values, label))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn clean_header_name(name: &str) -> &str {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}')
}

fn normalize_header_name(name: &str) -> String {
    clean_header_name(name).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\u{feff}id,checking,duration,Default\n\
                       1,A11,6,good\n\
                       2,A12,48,BAD\n\
                       3,A14,12,maybe\n\
                       4,A11,24,good\n";

    #[test]
    fn reads_rows_and_skips_unknown_labels() {
        let loaded = read_dataset(CSV.as_bytes(), &LabelSpec::default(), &["id".to_string()]).unwrap();
        assert_eq!(loaded.rows_read, 4);
        assert_eq!(loaded.dataset.columns, vec!["checking", "duration"]);
        assert_eq!(loaded.dataset.len(), 3);
        assert_eq!(loaded.row_errors.len(), 1);
        assert_eq!(loaded.row_errors[0].line, 4);

        let row = &loaded.dataset.rows[1];
        assert_eq!(row.label, Label::Bad);
        assert_eq!(row.values, vec!["A12", "48"]);
        assert_eq!(row.line, 3);
    }

    #[test]
    fn missing_label_column_is_an_error() {
        let spec = LabelSpec {
            column: "outcome".to_string(),
            ..LabelSpec::default()
        };
        let err = read_dataset(CSV.as_bytes(), &spec, &[]).unwrap_err();
        assert!(matches!(err, IngestError::MissingLabelColumn(ref c) if c == "outcome"));
    }

    #[test]
    fn unknown_drop_column_is_an_error() {
        let err = read_dataset(CSV.as_bytes(), &LabelSpec::default(), &["nope".to_string()]).unwrap_err();
        assert!(matches!(err, IngestError::UnknownDropColumn(_)));
    }

    #[test]
    fn short_rows_are_reported() {
        let csv = "a,default\n1,good\n2\n3,bad\n";
        let loaded = read_dataset(csv.as_bytes(), &LabelSpec::default(), &[]).unwrap();
        assert_eq!(loaded.dataset.len(), 2);
        assert_eq!(loaded.row_errors.len(), 1);
        assert!(loaded.row_errors[0].message.contains("Expected 2 fields"));
    }

    #[test]
    fn no_valid_rows_fails() {
        let csv = "a,default\n1,unknown\n";
        let err = read_dataset(csv.as_bytes(), &LabelSpec::default(), &[]).unwrap_err();
        assert!(matches!(err, IngestError::NoRows { rows_read: 1 }));
    }
}
