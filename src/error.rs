//! Top-level error carrier.
//!
//! Each pipeline stage has its own typed error (`IngestError`,
//! `FeatureBuildError`, ...). At the application boundary they are converted into
//! an `AppError`, which only knows a message and the process exit code.
//!
//! Exit codes:
//! - `2`: invalid input/configuration (bad flags, unreadable files, no usable rows)
//! - `3`: unusable data (degenerate features or partitions)
//! - `4`: computation failure (fit/evaluation)

use crate::eval::{DevianceError, EvalError};
use crate::features::FeatureBuildError;
use crate::fit::FitError;
use crate::io::ingest::IngestError;
use crate::partition::PartitionError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl From<FeatureBuildError> for AppError {
    fn from(err: FeatureBuildError) -> Self {
        AppError::new(3, format!("Feature build failed: {err}"))
    }
}

impl From<PartitionError> for AppError {
    fn from(err: PartitionError) -> Self {
        AppError::new(3, format!("Partition failed: {err}"))
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(4, format!("Model fit failed: {err}"))
    }
}

impl From<DevianceError> for AppError {
    fn from(err: DevianceError) -> Self {
        AppError::new(4, format!("Deviance computation failed: {err}"))
    }
}

impl From<EvalError> for AppError {
    fn from(err: EvalError) -> Self {
        AppError::new(4, format!("Evaluation failed: {err}"))
    }
}
