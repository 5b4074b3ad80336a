//! Mathematical utilities: logistic link functions and small statistics helpers.

pub mod logistic;
pub mod stats;

pub use logistic::*;
pub use stats::*;
