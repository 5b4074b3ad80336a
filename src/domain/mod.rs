//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - loaded dataset rows and binary outcome labels (`DatasetRow`, `Label`)
//! - regularization-strength selection rules (`SelectionRule`)
//! - typed result records and failures (`ResultRecord`, `FitFailure`, `EvalFailure`)
//! - the run configuration (`PipelineConfig`) and the exported `ResultsFile`

pub mod types;

pub use types::*;
