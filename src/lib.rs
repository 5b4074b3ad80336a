//! `credit-sweep` library crate.
//!
//! The binary (`sweep`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - each pipeline stage (ingest, features, partition, fit, eval) can be used on its own

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod eval;
pub mod features;
pub mod fit;
pub mod io;
pub mod math;
pub mod partition;
pub mod plot;
pub mod report;
