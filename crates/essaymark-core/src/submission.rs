//! Per-submission lifecycle: `drafting` → `round1_scored` → `round2_scored`.
//!
//! Each essay gets its own [`Submission`]; nothing is shared between
//! submissions. Stages only move forward, and a finished submission is never
//! reopened: a new attempt starts a new value.

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::payload::AnnotationPayload;
use crate::revision::RevisionAudit;
use crate::score::ScoreResult;
use crate::text::Redactor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Drafting,
    Round1Scored,
    Round2Scored,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drafting => "drafting",
            Self::Round1Scored => "round1_scored",
            Self::Round2Scored => "round2_scored",
        }
    }
}

/// Grading pass, as written to the submission log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Round {
    First,
    Revision,
}

impl Round {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "FIRST",
            Self::Revision => "REVISION",
        }
    }
}

/// A marked first draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstRound {
    pub essay: String,
    pub word_count: usize,
    pub payload: AnnotationPayload,
    pub score: ScoreResult,
    pub feedback: String,
}

/// An audited revision. Carries no score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRound {
    pub essay: String,
    pub word_count: usize,
    pub audit: RevisionAudit,
    pub report: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    group: String,
    students: Vec<String>,
    stage: Stage,
    first: Option<FirstRound>,
    revision: Option<RevisionRound>,
}

impl Submission {
    pub fn new(group: impl Into<String>, students: Vec<String>) -> Self {
        Self {
            group: group.into(),
            students: students
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            stage: Stage::Drafting,
            first: None,
            revision: None,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn students(&self) -> &[String] {
        &self.students
    }

    /// Student names as a single comma-separated field.
    pub fn student_list(&self) -> String {
        self.students.join(", ")
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn first_round(&self) -> Option<&FirstRound> {
        self.first.as_ref()
    }

    pub fn revision_round(&self) -> Option<&RevisionRound> {
        self.revision.as_ref()
    }

    /// Scrubber for this submission's student names.
    pub fn redactor(&self) -> Redactor {
        Redactor::new(self.students.as_slice())
    }

    /// `drafting` → `round1_scored`.
    pub fn record_first_round(&mut self, round: FirstRound) -> Result<&FirstRound, LifecycleError> {
        if self.stage != Stage::Drafting {
            return Err(LifecycleError::AlreadyScored(self.stage));
        }
        self.stage = Stage::Round1Scored;
        Ok(self.first.insert(round))
    }

    /// `round1_scored` → `round2_scored`.
    pub fn record_revision(&mut self, round: RevisionRound) -> Result<&RevisionRound, LifecycleError> {
        if self.stage != Stage::Round1Scored {
            return Err(LifecycleError::NotReadyForRevision(self.stage));
        }
        self.stage = Stage::Round2Scored;
        Ok(self.revision.insert(round))
    }
}

/// Flat log entry for one round, append-only.
///
/// Field names match the spreadsheet web app's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(rename = "type")]
    pub round: Round,
    pub group: String,
    pub students: String,
    pub assignment: String,
    pub essay: String,
    /// `x/10`; absent for revisions.
    pub grade: Option<String>,
    pub feedback: String,
    pub word_count: usize,
    /// RFC 3339 timestamp.
    pub submitted_at: String,
}
