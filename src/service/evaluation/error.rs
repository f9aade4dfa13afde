//! Error types for evaluation

use thiserror::Error;

use crate::service::judge::JudgeError;

/// Error type for evaluation
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("evaluation failed: {0}")]
    EvaluationFailed(#[from] JudgeError),
}
