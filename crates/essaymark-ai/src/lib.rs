//! Model collaborator: builds rubric prompts, calls the hosted model, unwraps replies.

mod client;
pub mod prompt;
pub mod response;

pub use client::{GeminiClient, ModelBackend, ModelConfig, ModelError, RetryPolicy};
pub use prompt::{build_grading_prompt, build_revision_prompt};
pub use response::{parse_annotation, parse_audit, strip_code_fence};
