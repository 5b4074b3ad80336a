//! Data sources.
//!
//! - seeded synthetic credit datasets (`sample`)

pub mod sample;

pub use sample::*;
