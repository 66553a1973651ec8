//! Terminal rendering for submissions and the rubric table.
//!
//! Reports produced by the core are printed as-is; these helpers only add
//! the surrounding card for the person running the tool.

use std::fmt::Write;

use essaymark_core::{AuditStatus, Dimension, MarkFormat, Rubric, Submission};

// ── Public API ──

/// Vertical card summarising where a submission stands.
pub fn submission_card(submission: &Submission, format: &MarkFormat) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ({}) ===", submission.student_list(), submission.group());
    row(&mut out, "stage", submission.stage().as_str());

    if let Some(first) = submission.first_round() {
        section(&mut out, "First draft");
        row(&mut out, "words", first.word_count);
        for dimension in Dimension::PENALTY_BEARING {
            row(
                &mut out,
                dimension.as_str(),
                format.format_score(first.score.dimension(dimension), dimension.max_score()),
            );
        }
        row(
            &mut out,
            Dimension::Vocabulary.as_str(),
            format.format_score(first.score.vocabulary, Dimension::Vocabulary.max_score()),
        );
        row(&mut out, "errors flagged", first.payload.total_instances());
        row(&mut out, "mark", format.mark_value(first.score.total));
    }

    if let Some(revision) = submission.revision_round() {
        section(&mut out, "Revision");
        row(&mut out, "words", revision.word_count);
        for status in [
            AuditStatus::Fixed,
            AuditStatus::StillPresent,
            AuditStatus::IncorrectlyFixed,
        ] {
            row(&mut out, status.as_str(), revision.audit.count(status));
        }
        row(&mut out, "new errors", revision.audit.new_errors.len());
    }
    out
}

/// The category table as the marker sees it, weights included.
pub fn rubric_table(rubric: &Rubric) -> String {
    let mut out = String::new();
    for dimension in Dimension::PENALTY_BEARING {
        let _ = writeln!(
            out,
            "{} (from {})",
            dimension.title(),
            rubric.starting_score
        );
        for cat in rubric.categories_for(dimension) {
            let _ = writeln!(
                out,
                "  {:<24} {:>5}  {:<15} {}",
                cat.code.as_str(),
                cat.weight,
                cat.aggregation.as_str(),
                cat.label
            );
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "Connectors: at least {} in total and {} different, or -{} on {}",
        rubric.connectors.min_total,
        rubric.connectors.min_distinct,
        rubric.connectors.penalty,
        Dimension::Coherence.as_str()
    );
    let _ = writeln!(
        out,
        "Length: {} words or fewer scores 0; under {} words halves the total",
        rubric.length.too_short_max, rubric.length.full_length_min
    );
    out
}

// ── Rows ──

fn section(out: &mut String, header: &str) {
    let _ = writeln!(out, "\n{header}");
}

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {label:<18} {value}");
}
