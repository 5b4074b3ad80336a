//! The sweep pipeline shared by the CLI and the integration tests.
//!
//! load -> features -> stratified split -> folds -> parallel CV sweep -> evaluation

use tracing::info;

use crate::domain::{FitFailure, PipelineConfig};
use crate::error::AppError;
use crate::eval::{EvaluationReport, evaluate};
use crate::features::{FeatureOptions, FeatureSet, build_features};
use crate::fit::{PathOptions, SweepOutcome, alpha_grid, run_sweep};
use crate::io::ingest::{LabelSpec, LoadedDataset, load_dataset};
use crate::partition::{FoldAssignment, Split, assign_folds, split};
use crate::report::RunSummary;

/// All computed outputs of a single `sweep run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub loaded: LoadedDataset,
    pub features: FeatureSet,
    pub split: Split,
    pub folds: FoldAssignment,
    pub alphas: Vec<f64>,
    pub sweep: SweepOutcome,
    pub report: EvaluationReport,
    pub fit_failures: Vec<FitFailure>,
    pub summary: RunSummary,
}

/// Load the configured dataset and run the whole pipeline.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    config.validate()?;
    let label = LabelSpec {
        column: config.label_column.clone(),
        positive: config.positive_label.clone(),
        negative: config.negative_label.clone(),
    };
    let loaded = load_dataset(&config.data_path, &label, &config.drop_columns)?;
    run_pipeline_on_dataset(config, loaded)
}

/// Run the pipeline on an already loaded dataset.
pub fn run_pipeline_on_dataset(config: &PipelineConfig, loaded: LoadedDataset) -> Result<RunOutput, AppError> {
    let feature_opts = FeatureOptions {
        numeric: config.numeric_columns.clone(),
        categorical: config.categorical_columns.clone(),
    };
    let features = build_features(&loaded.dataset, &feature_opts)?;
    info!(
        rows = features.x.nrows(),
        columns = features.x.ncols(),
        "design matrix built"
    );

    let y = &features.y;
    let split = split(y, config.train_fraction, config.seed)?;
    let x_train = features.x.select_rows(&split.train);
    let x_test = features.x.select_rows(&split.test);
    let y_train: Vec<u8> = split.train.iter().map(|&i| y[i]).collect();
    let y_test: Vec<u8> = split.test.iter().map(|&i| y[i]).collect();
    info!(train = y_train.len(), test = y_test.len(), seed = config.seed, "stratified split");

    let folds = assign_folds(&y_train, config.n_folds, config.fold_seed)?;

    let alphas = alpha_grid(config.alpha_steps)?;
    let opts = PathOptions {
        n_lambda: config.n_lambda,
        lambda_min_ratio: config.lambda_min_ratio,
        tol: config.tol,
        max_iter: config.max_iter,
        ..PathOptions::default()
    };
    let sweep = run_sweep(&x_train.matrix, &y_train, &folds, &alphas, &opts);

    let fit_failures: Vec<FitFailure> = sweep
        .failures()
        .map(|(alpha, e)| FitFailure {
            alpha,
            message: e.to_string(),
        })
        .collect();

    let report = evaluate(&sweep, &x_train.matrix, &y_train, &x_test.matrix, &y_test)?;

    let summary = RunSummary {
        data_path: config.data_path.display().to_string(),
        rows_read: loaded.rows_read,
        rows_loaded: loaded.dataset.len(),
        rows_skipped: loaded.row_errors.len(),
        train_rows: y_train.len(),
        train_bad: count_bad(&y_train),
        test_rows: y_test.len(),
        test_bad: count_bad(&y_test),
        features: features.x.ncols(),
        folds: folds.k(),
        alphas: alphas.len(),
        seed: config.seed,
        fold_seed: config.fold_seed,
    };

    Ok(RunOutput {
        loaded,
        features,
        split,
        folds,
        alphas,
        sweep,
        report,
        fit_failures,
        summary,
    })
}

fn count_bad(y: &[u8]) -> usize {
    y.iter().filter(|&&v| v == 1).count()
}
