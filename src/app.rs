//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments into a validated `PipelineConfig`
//! - runs the sweep pipeline or the synthetic data generator
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, GenerateArgs, PlotArgs, RunArgs};
use crate::domain::PipelineConfig;
use crate::error::AppError;
use crate::io::results::ResultsMeta;

pub mod pipeline;

/// Entry point for the `sweep` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Generate(args) => handle_generate(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args);
    config.validate()?;
    configure_threads(config.threads)?;

    let run = pipeline::run_pipeline(&config)?;
    let best_alpha = run.report.best_alpha;

    println!("{}", crate::report::format_run_summary(&run.summary));
    println!(
        "{}",
        crate::report::format_training_table(&run.report.training, Some(best_alpha))
    );
    println!("Chosen alpha: {best_alpha:.2} (lowest training deviance under lambda.1se)\n");
    println!("{}", crate::report::format_test_table(&run.report.test, best_alpha));

    let failures = crate::report::format_failures(&run.fit_failures, &run.report.failures);
    if !failures.is_empty() {
        println!("{failures}");
    }

    if config.plot {
        let plot = crate::plot::render_deviance_plot(
            &run.report.training,
            Some(best_alpha),
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.report.training, &run.report.test)?;
        info!(path = %path.display(), "results CSV written");
    }
    if let Some(path) = &config.export_json {
        let meta = ResultsMeta {
            seed: config.seed,
            fold_seed: config.fold_seed,
            train_rows: run.split.train.len(),
            test_rows: run.split.test.len(),
            features: run.features.x.columns.clone(),
        };
        let results = crate::io::results::results_file(meta, &run.report, &run.fit_failures);
        crate::io::results::write_results_json(path, &results)?;
        info!(path = %path.display(), "results JSON written");
    }

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let applicants = crate::data::generate_to_file(&args.out, args.rows, args.seed)?;
    println!("Wrote {} applicants to {}", applicants.len(), args.out.display());
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let results = crate::io::results::read_results_json(&args.results)?;
    let plot = crate::plot::render_deviance_plot_from_results(&results, args.width, args.height);
    println!("{plot}");
    Ok(())
}

/// Size the global rayon pool used by the sweep.
fn configure_threads(threads: Option<usize>) -> Result<(), AppError> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| AppError::new(2, format!("Failed to configure {n} worker threads: {e}")))?;
    }
    Ok(())
}

pub fn pipeline_config_from_args(args: &RunArgs) -> PipelineConfig {
    let fold_seed = match args.fold_seed {
        Some(seed) => seed,
        None => {
            info!(seed = args.seed, "no --fold-seed given; folds use --seed");
            args.seed
        }
    };

    PipelineConfig {
        data_path: args.data.clone(),
        label_column: args.label.clone(),
        positive_label: args.positive.clone(),
        negative_label: args.negative.clone(),
        drop_columns: args.drop.clone(),
        numeric_columns: args.numeric.clone(),
        categorical_columns: args.categorical.clone(),
        train_fraction: args.train_fraction,
        seed: args.seed,
        fold_seed,
        n_folds: args.folds,
        alpha_steps: args.alpha_steps,
        n_lambda: args.n_lambda,
        lambda_min_ratio: args.lambda_min_ratio,
        tol: args.tol,
        max_iter: args.max_iter,
        threads: args.threads,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_json: args.export_json.clone(),
    }
}
