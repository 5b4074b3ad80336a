//! Read/write results JSON files.
//!
//! The schema is `domain::ResultsFile`: run metadata, both result tables with
//! predictions, and every recorded failure. `sweep plot` reads it back.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{FitFailure, ResultsFile};
use crate::error::AppError;
use crate::eval::EvaluationReport;

/// Run metadata stored alongside the result tables.
#[derive(Debug, Clone)]
pub struct ResultsMeta {
    pub seed: u64,
    pub fold_seed: u64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub features: Vec<String>,
}

/// Assemble the serializable results of a run.
pub fn results_file(meta: ResultsMeta, report: &EvaluationReport, fit_failures: &[FitFailure]) -> ResultsFile {
    ResultsFile {
        tool: "sweep".to_string(),
        generated_at: Utc::now(),
        seed: meta.seed,
        fold_seed: meta.fold_seed,
        train_rows: meta.train_rows,
        test_rows: meta.test_rows,
        features: meta.features,
        best_alpha: report.best_alpha,
        training: report.training.clone(),
        test: report.test.clone(),
        fit_failures: fit_failures.to_vec(),
        eval_failures: report.failures.clone(),
    }
}

/// Write a results JSON file.
pub fn write_results_json(path: &Path, results: &ResultsFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, results)
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))?;
    Ok(())
}

/// Read a results JSON file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open results JSON '{}': {e}", path.display())))?;
    let results: ResultsFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid results JSON: {e}")))?;
    Ok(results)
}
