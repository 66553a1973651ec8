use thiserror::Error;

use crate::rubric::CategoryCode;
use crate::submission::Stage;

/// A model reply that cannot be scored.
///
/// Scoring never runs over a partial payload: any of these aborts the round
/// and leaves the submission where it was.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply is missing error category '{}'", .0.as_str())]
    MissingCategory(CategoryCode),

    #[error("vocabulary level must be 0, 1 or 2, got {0}")]
    InvalidVocabulary(f64),
}

/// A rubric table that fails validation.
#[derive(Debug, Error)]
pub enum RubricError {
    #[error("rubric is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("category '{}' is listed more than once", .0.as_str())]
    DuplicateCategory(CategoryCode),

    #[error("category '{}' has a negative weight", .0.as_str())]
    NegativeWeight(CategoryCode),

    #[error("category '{}' belongs to the vocabulary dimension, which carries no penalties", .0.as_str())]
    UnscoredDimension(CategoryCode),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot record a first round: submission is already {}", .0.as_str())]
    AlreadyScored(Stage),

    #[error("cannot record a revision: submission is {}", .0.as_str())]
    NotReadyForRevision(Stage),
}
