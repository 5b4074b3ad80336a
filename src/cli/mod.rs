//! Command-line parsing for the elastic-net alpha sweep.
//!
//! Argument parsing and command dispatch stay separate from the modeling code;
//! `app` turns these structs into a `PipelineConfig`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sweep", version, about = "Elastic-net logistic regression alpha sweep for credit data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a dataset, sweep the mixing grid, and report training/test deviance.
    Run(RunArgs),
    /// Write a seeded synthetic credit dataset.
    Generate(GenerateArgs),
    /// Plot a previously exported results JSON.
    Plot(PlotArgs),
}

/// Options for a full sweep.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Input CSV (one row per applicant, header row required).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Seed for the stratified train/test split.
    #[arg(long)]
    pub seed: u64,

    /// Seed for the fold assignment (defaults to --seed).
    #[arg(long)]
    pub fold_seed: Option<u64>,

    /// Outcome column.
    #[arg(long, default_value = "default")]
    pub label: String,

    /// Outcome value treated as the positive (`bad`) class.
    #[arg(long, default_value = "bad")]
    pub positive: String,

    /// Outcome value treated as the negative (`good`) class.
    #[arg(long, default_value = "good")]
    pub negative: String,

    /// Columns to exclude from the features (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub drop: Vec<String>,

    /// Columns that must be numeric (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub numeric: Vec<String>,

    /// Columns always treated as categorical (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub categorical: Vec<String>,

    /// Fraction of each class drawn into the training set.
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Cross-validation folds.
    #[arg(long, default_value_t = 10)]
    pub folds: usize,

    /// Points in the mixing grid over [0, 1].
    #[arg(long, default_value_t = 21)]
    pub alpha_steps: usize,

    /// Lambdas per regularization path.
    #[arg(long, default_value_t = 100)]
    pub n_lambda: usize,

    /// Smallest lambda as a fraction of lambda_max (data-dependent by default).
    #[arg(long)]
    pub lambda_min_ratio: Option<f64>,

    /// Coordinate-descent convergence threshold.
    #[arg(long, default_value_t = 1e-7)]
    pub tol: f64,

    /// IRLS iterations per lambda.
    #[arg(long, default_value_t = 100)]
    pub max_iter: usize,

    /// Worker threads for the sweep (defaults to one per core).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export result tables to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export result tables (with predictions) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Output CSV.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of applicants.
    #[arg(long, default_value_t = 1000)]
    pub rows: usize,

    /// Generator seed.
    #[arg(long)]
    pub seed: u64,
}

/// Options for plotting saved results.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Results JSON produced by `sweep run --export-json`.
    #[arg(long, value_name = "JSON")]
    pub results: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_a_seed() {
        assert!(Cli::try_parse_from(["sweep", "run", "--data", "credit.csv"]).is_err());
    }

    #[test]
    fn run_parses_lists_and_defaults() {
        let cli = Cli::try_parse_from([
            "sweep", "run", "--data", "credit.csv", "--seed", "7", "--drop", "id,branch", "--no-plot",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.seed, 7);
        assert_eq!(args.fold_seed, None);
        assert_eq!(args.drop, vec!["id", "branch"]);
        assert_eq!(args.folds, 10);
        assert_eq!(args.alpha_steps, 21);
        assert_eq!(args.train_fraction, 0.8);
        assert!(args.no_plot);
    }
}
