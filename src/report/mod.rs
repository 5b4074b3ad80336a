//! Terminal reporting: run summary, result tables, failures.

pub mod format;

pub use format::*;

use crate::domain::{DataSplit, ResultRecord, SelectionRule};

/// Headline figures for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub data_path: String,
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub train_rows: usize,
    pub train_bad: usize,
    pub test_rows: usize,
    pub test_bad: usize,
    pub features: usize,
    pub folds: usize,
    pub alphas: usize,
    pub seed: u64,
    pub fold_seed: u64,
}

/// Record for `(alpha, rule)` on `split`, if it was scored.
pub fn find_record(records: &[ResultRecord], alpha: f64, rule: SelectionRule, split: DataSplit) -> Option<&ResultRecord> {
    records
        .iter()
        .find(|r| r.alpha == alpha && r.rule == rule && r.split == split)
}

/// Distinct alphas in first-seen order.
pub fn alphas_in_order(records: &[ResultRecord]) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for r in records {
        if !out.contains(&r.alpha) {
            out.push(r.alpha);
        }
    }
    out
}
