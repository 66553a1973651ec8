//! Student-facing report for a marked first draft.
//!
//! Layout: overall impression, one section per dimension headed by its score
//! out of its maximum, flagged excerpts grouped under their category label,
//! and the final mark line last. Deductions and weights never appear; the
//! report shows where marks went, not how they were counted.

use crate::mark::MarkFormat;
use crate::payload::AnnotationPayload;
use crate::rubric::{Dimension, Rubric};
use crate::score::ScoreResult;
use crate::text::Redactor;

const CONNECTOR_NOTE: &str =
    "Linking words: use more connectors (and, but, because, however...) and vary them.";
const LENGTH_NOTE: &str =
    "The composition is shorter than the required length, which lowers the final mark.";

pub struct FeedbackRenderer<'a> {
    rubric: &'a Rubric,
    format: &'a MarkFormat,
    redactor: Redactor,
}

impl<'a> FeedbackRenderer<'a> {
    pub fn new(rubric: &'a Rubric, format: &'a MarkFormat, redactor: Redactor) -> Self {
        Self {
            rubric,
            format,
            redactor,
        }
    }

    /// Render the report for a scored payload.
    pub fn render(&self, payload: &AnnotationPayload, score: &ScoreResult) -> String {
        let mut lines = Vec::new();

        let impression = self.redactor.scrub(&payload.impression);
        if !impression.is_empty() {
            lines.push(impression);
            lines.push(String::new());
        }

        for dimension in Dimension::PENALTY_BEARING {
            self.push_dimension(&mut lines, dimension, payload, score);
            lines.push(String::new());
        }

        lines.push(format!(
            "{}: {}",
            Dimension::Vocabulary.title(),
            self.format
                .format_score(score.vocabulary, Dimension::Vocabulary.max_score())
        ));
        lines.push(format!("  {}", payload.vocabulary.description()));
        lines.push(String::new());

        if score.length_penalty {
            lines.push(LENGTH_NOTE.to_string());
            lines.push(String::new());
        }

        lines.push(self.format.mark_line(score.total));
        lines.join("\n")
    }

    /// Fixed report for an essay at or below the too-short threshold.
    pub fn render_too_short(&self) -> String {
        format!(
            "This composition is too short to be marked. Write at least {} words and submit it again.\n\n{}",
            self.rubric.length.too_short_max + 1,
            self.format.mark_line(0.0)
        )
    }

    fn push_dimension(
        &self,
        lines: &mut Vec<String>,
        dimension: Dimension,
        payload: &AnnotationPayload,
        score: &ScoreResult,
    ) {
        lines.push(format!(
            "{}: {}",
            dimension.title(),
            self.format
                .format_score(score.dimension(dimension), dimension.max_score())
        ));

        let mut any = false;
        for cat in self.rubric.categories_for(dimension) {
            let instances = payload.instances(cat.code);
            if instances.is_empty() {
                continue;
            }
            any = true;
            lines.push(format!("  {}", cat.label));
            for inst in instances {
                lines.push(format!(
                    "    - \"{}\" — {}",
                    inst.quote,
                    self.redactor.scrub(&inst.explanation)
                ));
            }
        }

        if dimension == Dimension::Coherence && score.connector_penalty {
            any = true;
            lines.push(format!("  {CONNECTOR_NOTE}"));
        }

        if !any {
            lines.push("  No errors found.".to_string());
        }
    }
}
