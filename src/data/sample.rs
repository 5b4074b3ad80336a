//! Synthetic credit dataset generation.
//!
//! Applicants get a handful of numeric and categorical attributes; the
//! good/bad outcome is then drawn from a logistic model of those attributes,
//! so a penalized fit has real signal to recover.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::LogNormal;
use serde::Serialize;
use tracing::info;

use crate::domain::Label;
use crate::error::AppError;
use crate::math::sigmoid;

/// Smallest sample that reliably contains both outcomes.
pub const MIN_SAMPLE_ROWS: usize = 20;

const CHECKING_STATUS: [(&str, f64); 4] = [("<0", 1.0), ("0<=X<200", 0.5), (">=200", -0.3), ("none", -0.8)];
const PURPOSE: [(&str, f64); 5] = [
    ("business", 0.2),
    ("car", 0.1),
    ("education", 0.4),
    ("furniture", 0.0),
    ("radio/tv", -0.2),
];
const HOUSING: [(&str, f64); 3] = [("free", 0.2), ("own", 0.0), ("rent", 0.3)];

/// Baseline log-odds of a bad outcome.
const INTERCEPT: f64 = -1.3;

/// One synthetic applicant, serialized as one CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applicant {
    pub id: String,
    pub checking_status: String,
    /// Months.
    pub duration: u32,
    pub credit_amount: u32,
    /// Share of disposable income, 1 (low) to 4 (high).
    pub installment_rate: u8,
    pub purpose: String,
    pub age: u32,
    pub housing: String,
    pub default: String,
}

/// Draw `rows` applicants; identical `(rows, seed)` give identical output.
pub fn generate_credit_sample(rows: usize, seed: u64) -> Result<Vec<Applicant>, AppError> {
    if rows < MIN_SAMPLE_ROWS {
        return Err(AppError::new(
            2,
            format!("Sample size must be >= {MIN_SAMPLE_ROWS}, got {rows}."),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let amount_dist =
        LogNormal::<f64>::new(7.9, 0.7).map_err(|e| AppError::new(4, format!("Amount distribution error: {e}")))?;

    let mut out = Vec::with_capacity(rows);
    for i in 0..rows {
        let (checking, checking_effect) = CHECKING_STATUS[rng.gen_range(0..CHECKING_STATUS.len())];
        let (purpose, purpose_effect) = PURPOSE[rng.gen_range(0..PURPOSE.len())];
        let (housing, housing_effect) = HOUSING[rng.gen_range(0..HOUSING.len())];
        let duration: u32 = rng.gen_range(4..=72);
        let credit_amount = amount_dist.sample(&mut rng).clamp(250.0, 20_000.0).round() as u32;
        let installment_rate: u8 = rng.gen_range(1..=4);
        let age: u32 = rng.gen_range(19..=75);

        let eta = INTERCEPT
            + checking_effect
            + purpose_effect
            + housing_effect
            + 0.03 * (f64::from(duration) - 20.0)
            + 0.00008 * (f64::from(credit_amount) - 3000.0)
            + 0.15 * (f64::from(installment_rate) - 2.5)
            - 0.02 * (f64::from(age) - 35.0);
        let roll: f64 = rng.r#gen();
        let label = if roll < sigmoid(eta) { Label::Bad } else { Label::Good };

        out.push(Applicant {
            id: format!("A{:05}", i + 1),
            checking_status: checking.to_string(),
            duration,
            credit_amount,
            installment_rate,
            purpose: purpose.to_string(),
            age,
            housing: housing.to_string(),
            default: label.display_name().to_string(),
        });
    }

    Ok(out)
}

/// Write applicants as CSV (header row first).
pub fn write_credit_csv<W: Write>(writer: W, applicants: &[Applicant]) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    for a in applicants {
        csv.serialize(a)
            .map_err(|e| AppError::new(2, format!("Failed to write sample row: {e}")))?;
    }
    csv.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sample CSV: {e}")))?;
    Ok(())
}

/// Generate a sample and write it to `path`.
pub fn generate_to_file(path: &Path, rows: usize, seed: u64) -> Result<Vec<Applicant>, AppError> {
    let applicants = generate_credit_sample(rows, seed)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    write_credit_csv(file, &applicants)?;

    let bad = applicants.iter().filter(|a| a.default == Label::Bad.display_name()).count();
    info!(rows, bad, seed, path = %path.display(), "synthetic dataset written");
    Ok(applicants)
}
