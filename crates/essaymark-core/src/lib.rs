//! Deterministic rubric engine: scoring, feedback rendering, revision audits.
//!
//! Nothing in this crate performs I/O. Model replies arrive as JSON text and
//! leave as [`ScoreResult`]s and rendered reports.

pub mod assignment;
pub mod error;
pub mod feedback;
pub mod mark;
pub mod payload;
pub mod revision;
pub mod rubric;
pub mod score;
pub mod submission;
pub mod text;

#[cfg(test)]
mod test_support;

pub use assignment::Assignment;
pub use error::{LifecycleError, PayloadError, RubricError};
pub use feedback::FeedbackRenderer;
pub use mark::MarkFormat;
pub use payload::{AnnotationPayload, ErrorInstance, VocabularyLevel};
pub use revision::{AuditStatus, AuditedInstance, NewError, RevisionAudit, render_revision};
pub use rubric::{Aggregation, CategoryCode, Dimension, ErrorCategory, Rubric};
pub use score::{ScoreResult, compute_score};
pub use submission::{FirstRound, RevisionRound, Round, Stage, Submission, SubmissionRecord};
pub use text::{Redactor, word_count};
