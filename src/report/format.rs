//! Formatted terminal output.
//!
//! Formatting lives here so the fitting and evaluation code never prints.

use crate::domain::{DataSplit, EvalFailure, FitFailure, ResultRecord, SelectionRule};
use crate::report::{RunSummary, alphas_in_order, find_record};

/// Dataset, partition and sweep figures.
pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("=== sweep - elastic-net logistic alpha sweep ===\n");
    out.push_str(&format!("Data: {}\n", summary.data_path));
    out.push_str(&format!(
        "Rows: read={} loaded={} skipped={}\n",
        summary.rows_read, summary.rows_loaded, summary.rows_skipped
    ));
    out.push_str(&format!(
        "Split: train={} ({} bad) | test={} ({} bad) | seed={}\n",
        summary.train_rows, summary.train_bad, summary.test_rows, summary.test_bad, summary.seed
    ));
    out.push_str(&format!(
        "Design: {} feature columns | {}-fold CV (fold seed {}) | {} alphas\n",
        summary.features, summary.folds, summary.fold_seed, summary.alphas
    ));

    out
}

/// One row per alpha with both selection rules side by side; `*` marks `best_alpha`.
pub fn format_training_table(records: &[ResultRecord], best_alpha: Option<f64>) -> String {
    let mut out = String::new();
    out.push_str("Training deviance by alpha:\n");
    push_header(&mut out);

    for alpha in alphas_in_order(records) {
        let chosen = if best_alpha == Some(alpha) { "*" } else { " " };
        let min = find_record(records, alpha, SelectionRule::MinError, DataSplit::Train);
        let one_se = find_record(records, alpha, SelectionRule::MinErrorPlusOneStdErr, DataSplit::Train);
        push_row(&mut out, chosen, alpha, min, one_se);
    }

    out
}

/// Test-set deviance for the chosen alpha.
pub fn format_test_table(records: &[ResultRecord], best_alpha: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Test deviance at alpha={best_alpha:.2}:\n"));
    push_header(&mut out);

    let min = find_record(records, best_alpha, SelectionRule::MinError, DataSplit::Test);
    let one_se = find_record(records, best_alpha, SelectionRule::MinErrorPlusOneStdErr, DataSplit::Test);
    push_row(&mut out, "*", best_alpha, min, one_se);

    out
}

/// Failed fits and unscored records; empty when there are none.
pub fn format_failures(fit_failures: &[FitFailure], eval_failures: &[EvalFailure]) -> String {
    if fit_failures.is_empty() && eval_failures.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str("Failures:\n");
    for f in fit_failures {
        out.push_str(&format!("  alpha={:.2} fit: {}\n", f.alpha, f.message));
    }
    for f in eval_failures {
        out.push_str(&format!(
            "  alpha={:.2} {} {}: {}\n",
            f.alpha,
            f.rule.display_name(),
            f.split.display_name(),
            f.message
        ));
    }
    out
}

fn push_header(out: &mut String) {
    out.push_str(&format!(
        "  {:>5} {:>12} {:>4} {:>10} {:>12} {:>4} {:>10}\n",
        "alpha", "lambda.min", "nz", "deviance", "lambda.1se", "nz", "deviance"
    ));
    out.push_str(&format!(
        "  {:-<5} {:-<12} {:-<4} {:-<10} {:-<12} {:-<4} {:-<10}\n",
        "", "", "", "", "", "", ""
    ));
}

fn push_row(out: &mut String, chosen: &str, alpha: f64, min: Option<&ResultRecord>, one_se: Option<&ResultRecord>) {
    out.push_str(
        format!(
            "{chosen} {alpha:>5.2} {} {}\n",
            fmt_cells(min),
            fmt_cells(one_se)
        )
        .trim_end(),
    );
    out.push('\n');
}

fn fmt_cells(record: Option<&ResultRecord>) -> String {
    match record {
        Some(r) => format!("{:>12.6e} {:>4} {:>10.4}", r.lambda, r.nonzero, r.deviance),
        None => format!("{:>12} {:>4} {:>10}", "-", "-", "-"),
    }
}
