//! Submission orchestrator: runs a first draft or a revision through the
//! model, the scoring core and the submission log.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use essaymark_ai::{
    ModelBackend, ModelError, build_grading_prompt, build_revision_prompt, parse_annotation,
    parse_audit,
};
use essaymark_core::{
    Assignment, FeedbackRenderer, FirstRound, LifecycleError, MarkFormat, PayloadError,
    RevisionRound, Round, Rubric, ScoreResult, Stage, Submission, SubmissionRecord,
    compute_score, render_revision, word_count,
};
use essaymark_sync::RecordSink;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum HostError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),
    #[error("model reply could not be read: {source}")]
    Malformed {
        #[source]
        source: PayloadError,
        /// Reply text as received, for inspection.
        raw: String,
    },
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// What a first-draft submission produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FirstDraftOutcome {
    Scored {
        feedback: String,
        score: ScoreResult,
        /// `x/10` as written on the mark line.
        mark: String,
    },
    /// At or below the length floor; marked 0 without consulting the model.
    /// The submission stays in `drafting`.
    TooShort { feedback: String, word_count: usize },
}

impl FirstDraftOutcome {
    pub fn feedback(&self) -> &str {
        match self {
            Self::Scored { feedback, .. } | Self::TooShort { feedback, .. } => feedback,
        }
    }
}

/// Upper bound on one submission-log append.
pub const DEFAULT_LOG_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Grader {
    model: Arc<dyn ModelBackend>,
    sink: Arc<dyn RecordSink>,
    rubric: Rubric,
    assignment: Assignment,
    format: MarkFormat,
    log_timeout: Duration,
}

impl Grader {
    pub fn new(
        model: Arc<dyn ModelBackend>,
        sink: Arc<dyn RecordSink>,
        rubric: Rubric,
        assignment: Assignment,
        format: MarkFormat,
    ) -> Self {
        Self {
            model,
            sink,
            rubric,
            assignment,
            format,
            log_timeout: DEFAULT_LOG_TIMEOUT,
        }
    }

    /// Give up on a log append after `timeout`; the round still completes.
    pub fn with_log_timeout(mut self, timeout: Duration) -> Self {
        self.log_timeout = timeout;
        self
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    fn check_author(&self, submission: &Submission) -> Result<(), HostError> {
        if submission.students().is_empty() {
            return Err(HostError::InvalidInput(
                "at least one student name is required".into(),
            ));
        }
        if !self.assignment.accepts_group(submission.group()) {
            return Err(HostError::InvalidInput(format!(
                "group {} is not taking \"{}\" (expected one of: {})",
                submission.group(),
                self.assignment.name,
                self.assignment.groups.join(", ")
            )));
        }
        Ok(())
    }

    /// Mark a first draft.
    ///
    /// Malformed model replies leave `submission` untouched so the draft can
    /// be resubmitted.
    pub async fn submit_first_draft(
        &self,
        submission: &mut Submission,
        essay: &str,
    ) -> Result<FirstDraftOutcome, HostError> {
        self.check_author(submission)?;
        if essay.trim().is_empty() {
            return Err(HostError::InvalidInput("the essay is empty".into()));
        }
        if submission.stage() != Stage::Drafting {
            return Err(LifecycleError::AlreadyScored(submission.stage()).into());
        }

        let words = word_count(essay);
        let renderer = FeedbackRenderer::new(&self.rubric, &self.format, submission.redactor());

        if self.rubric.length.is_too_short(words) {
            info!(group = submission.group(), words, "essay too short, not sent to the model");
            let feedback = renderer.render_too_short();
            self.log(submission, Round::First, essay, words, &feedback).await;
            return Ok(FirstDraftOutcome::TooShort {
                feedback,
                word_count: words,
            });
        }

        let prompt = build_grading_prompt(&self.rubric, &self.assignment, essay);
        let reply = self.model.generate(&prompt).await?;
        let payload = parse_annotation(&reply, &self.rubric).map_err(|source| {
            warn!(error = %source, "model reply is not a valid annotation");
            HostError::Malformed { source, raw: reply }
        })?;

        let score = compute_score(&payload, words, &self.rubric);
        let feedback = renderer.render(&payload, &score);
        info!(
            group = submission.group(),
            words,
            errors = payload.total_instances(),
            total = score.total,
            "first draft marked"
        );

        submission.record_first_round(FirstRound {
            essay: essay.to_string(),
            word_count: words,
            payload,
            score,
            feedback: feedback.clone(),
        })?;
        self.log(submission, Round::First, essay, words, &feedback).await;

        Ok(FirstDraftOutcome::Scored {
            mark: self.format.mark_value(score.total),
            feedback,
            score,
        })
    }

    /// Compare a revision against the first round's flagged errors. Returns
    /// the report, which carries no mark.
    pub async fn submit_revision(
        &self,
        submission: &mut Submission,
        revised: &str,
    ) -> Result<String, HostError> {
        self.check_author(submission)?;
        if revised.trim().is_empty() {
            return Err(HostError::InvalidInput("the revised essay is empty".into()));
        }
        let first = match (submission.stage(), submission.first_round()) {
            (Stage::Round1Scored, Some(first)) => first.clone(),
            (stage, _) => return Err(LifecycleError::NotReadyForRevision(stage).into()),
        };

        let prompt = build_revision_prompt(&self.rubric, &self.assignment, &first, revised);
        let reply = self.model.generate(&prompt).await?;
        let audit = parse_audit(&reply, &self.rubric).map_err(|source| {
            warn!(error = %source, "model reply is not a valid revision audit");
            HostError::Malformed { source, raw: reply }
        })?;

        let unchecked = audit.unchecked(&first.payload);
        if unchecked > 0 {
            warn!(unchecked, "revision audit skipped first-round errors");
        }
        let report = render_revision(&first.payload, &audit, &self.rubric, &submission.redactor());
        let words = word_count(revised);
        info!(
            group = submission.group(),
            words,
            new_errors = audit.new_errors.len(),
            "revision reviewed"
        );

        submission.record_revision(RevisionRound {
            essay: revised.to_string(),
            word_count: words,
            audit,
            report: report.clone(),
        })?;
        self.log(submission, Round::Revision, revised, words, &report).await;

        Ok(report)
    }

    fn record(
        &self,
        submission: &Submission,
        round: Round,
        essay: &str,
        words: usize,
        feedback: &str,
    ) -> SubmissionRecord {
        SubmissionRecord {
            round,
            group: submission.group().to_string(),
            students: submission.student_list(),
            assignment: self.assignment.name.clone(),
            essay: essay.to_string(),
            grade: match round {
                Round::First => self.format.extract_value(feedback),
                Round::Revision => None,
            },
            feedback: feedback.to_string(),
            word_count: words,
            submitted_at: Utc::now().to_rfc3339(),
        }
    }

    /// Best effort: a failed or slow append is logged and otherwise ignored.
    async fn log(
        &self,
        submission: &Submission,
        round: Round,
        essay: &str,
        words: usize,
        feedback: &str,
    ) {
        let record = self.record(submission, round, essay, words, feedback);
        match tokio::time::timeout(self.log_timeout, self.sink.append(&record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, round = round.as_str(), group = %record.group, "could not log submission");
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.log_timeout.as_millis() as u64,
                    round = round.as_str(),
                    group = %record.group,
                    "submission log timed out"
                );
            }
        }
    }
}
