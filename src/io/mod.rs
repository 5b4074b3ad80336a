//! Input/output helpers.
//!
//! - CSV dataset ingest + validation (`ingest`)
//! - result table export to CSV (`export`)
//! - results JSON read/write (`results`)

pub mod export;
pub mod ingest;
pub mod results;

pub use export::*;
pub use ingest::*;
pub use results::*;
