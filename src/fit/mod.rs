//! Regularized logistic regression fitting.
//!
//! Responsibilities:
//!
//! - generate the mixing grid and the per-alpha lambda sequence
//! - fit elastic-net logistic paths (coordinate descent)
//! - cross-validate a path on a fixed fold assignment
//! - sweep the mixing grid in parallel

pub mod cv;
pub mod error;
pub mod lambda_grid;
pub mod path;
pub mod sweep;

#[cfg(test)]
pub(crate) mod testutil;

pub use cv::*;
pub use error::*;
pub use lambda_grid::*;
pub use path::*;
pub use sweep::*;
