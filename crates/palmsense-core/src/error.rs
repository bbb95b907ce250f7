//! Error types for palmsense

use thiserror::Error;

use crate::LANDMARK_COUNT;

/// Rejections raised while validating a raw detection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("Wrong landmark count: expected {expected}, got {actual}")]
    WrongArity { expected: usize, actual: usize },

    #[error("Non-finite coordinate at landmark {index}")]
    NonFinite { index: usize },
}

impl LandmarkError {
    pub fn wrong_arity(actual: usize) -> Self {
        LandmarkError::WrongArity {
            expected: LANDMARK_COUNT,
            actual,
        }
    }
}

/// Result type for landmark validation
pub type LandmarkResult<T> = Result<T, LandmarkError>;
