//! Export result records to CSV.
//!
//! One line per record, meant for spreadsheets or downstream scripts.
//! Predictions are only carried by the JSON export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ResultRecord;
use crate::error::AppError;

/// Column order of the CSV export.
pub const RESULTS_CSV_HEADER: &str = "split,alpha,rule,lambda,nonzero,n,deviance";

/// Write training and test records to a CSV file.
pub fn write_results_csv(path: &Path, training: &[ResultRecord], test: &[ResultRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, training, test)
}

/// Write records as CSV to any writer.
pub fn write_results<W: Write>(mut out: W, training: &[ResultRecord], test: &[ResultRecord]) -> Result<(), AppError> {
    writeln!(out, "{RESULTS_CSV_HEADER}")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in training.iter().chain(test) {
        writeln!(
            out,
            "{},{},{},{:.10e},{},{},{:.10}",
            r.split.display_name(),
            r.alpha,
            r.rule.display_name(),
            r.lambda,
            r.nonzero,
            r.predictions.len(),
            r.deviance,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
