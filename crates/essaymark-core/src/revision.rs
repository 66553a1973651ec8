//! Second-round comparison against the first round's flagged errors.
//!
//! A revision earns feedback only: no score is computed and the rendered
//! report carries no mark.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PayloadError;
use crate::payload::{AnnotationPayload, ErrorInstance};
use crate::rubric::{CategoryCode, Dimension, Rubric};
use crate::text::Redactor;

/// What happened to an originally flagged excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Fixed,
    StillPresent,
    IncorrectlyFixed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::StillPresent => "still_present",
            Self::IncorrectlyFixed => "incorrectly_fixed",
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Self::Fixed => "✔",
            Self::StillPresent => "✘",
            Self::IncorrectlyFixed => "⚠",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::StillPresent => "still present",
            Self::IncorrectlyFixed => "incorrectly fixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditedInstance {
    /// Excerpt as flagged in the first round.
    pub quote: String,
    pub status: AuditStatus,
    /// Nudge toward the fix; absent when fixed.
    #[serde(default)]
    pub hint: Option<String>,
}

/// An error that appears in the revision but not in the first draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewError {
    pub quote: String,
    #[serde(alias = "rule")]
    pub explanation: String,
    /// Category code as the model gave it; unknown codes are kept but not shown.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionAudit {
    pub summary: String,
    pub errors: BTreeMap<CategoryCode, Vec<AuditedInstance>>,
    pub new_errors: Vec<NewError>,
    pub vocabulary_note: String,
}

#[derive(Deserialize)]
struct RawAudit {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    errors: BTreeMap<String, Vec<AuditedInstance>>,
    #[serde(default)]
    new_errors: Vec<NewError>,
    #[serde(default)]
    vocabulary_note: String,
}

impl RevisionAudit {
    /// Parse a model reply. Categories may be omitted; unknown ones are dropped.
    pub fn from_json(json: &str, rubric: &Rubric) -> Result<Self, PayloadError> {
        let raw: RawAudit = serde_json::from_str(json)?;

        let mut errors = BTreeMap::new();
        for (key, audited) in raw.errors {
            match CategoryCode::parse(&key) {
                Some(code) if rubric.category(code).is_some() => {
                    errors.insert(code, audited);
                }
                _ => warn!(category = %key, "ignoring audited category not in rubric"),
            }
        }

        Ok(Self {
            summary: raw.summary,
            errors,
            new_errors: raw.new_errors,
            vocabulary_note: raw.vocabulary_note,
        })
    }

    pub fn count(&self, status: AuditStatus) -> usize {
        self.errors
            .values()
            .flatten()
            .filter(|a| a.status == status)
            .count()
    }

    /// First-round instances the audit says nothing about.
    pub fn unchecked(&self, original: &AnnotationPayload) -> usize {
        original
            .errors
            .iter()
            .map(|(code, flagged)| {
                let audited = self.errors.get(code).map(Vec::as_slice).unwrap_or(&[]);
                let (pairs, _) = pair_by_quote(flagged, audited);
                pairs.iter().filter(|(_, a)| a.is_none()).count()
            })
            .sum()
    }
}

const NOT_CHECKED_MARKER: &str = "?";

/// Flagged first-round instances paired with their audit entry by quote, in
/// flagged order, plus audit entries whose quote matches nothing flagged.
fn pair_by_quote<'a>(
    flagged: &'a [ErrorInstance],
    audited: &'a [AuditedInstance],
) -> (
    Vec<(&'a ErrorInstance, Option<&'a AuditedInstance>)>,
    Vec<&'a AuditedInstance>,
) {
    let mut used = vec![false; audited.len()];
    let mut pairs = Vec::with_capacity(flagged.len());
    for f in flagged {
        let hit = audited
            .iter()
            .enumerate()
            .find(|(i, a)| !used[*i] && a.quote == f.quote);
        if let Some((i, _)) = hit {
            used[i] = true;
        }
        pairs.push((f, hit.map(|(_, a)| a)));
    }
    let extra = audited
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(a, _)| a)
        .collect();
    (pairs, extra)
}

fn audited_line(a: &AuditedInstance, redactor: &Redactor) -> String {
    let mut line = format!("    {} \"{}\" ({})", a.status.marker(), a.quote, a.status.label());
    if a.status != AuditStatus::Fixed
        && let Some(hint) = a.hint.as_deref().map(|h| redactor.scrub(h))
        && !hint.is_empty()
    {
        line.push_str(": ");
        line.push_str(&hint);
    }
    line
}

/// Render the revision report.
///
/// Every instance flagged in `original` gets a line, in its original order;
/// one the audit skipped is shown as not checked. Audit entries quoting
/// something that was never flagged go last in their category.
pub fn render_revision(
    original: &AnnotationPayload,
    audit: &RevisionAudit,
    rubric: &Rubric,
    redactor: &Redactor,
) -> String {
    let mut lines = Vec::new();

    let summary = redactor.scrub(&audit.summary);
    if !summary.is_empty() {
        lines.push(summary);
        lines.push(String::new());
    }

    for dimension in Dimension::PENALTY_BEARING {
        let mut section = Vec::new();
        for cat in rubric.categories_for(dimension) {
            let flagged = original.instances(cat.code);
            let audited = audit.errors.get(&cat.code).map(Vec::as_slice).unwrap_or(&[]);
            if flagged.is_empty() && audited.is_empty() {
                continue;
            }

            section.push(format!("  {}", cat.label));
            let (pairs, extra) = pair_by_quote(flagged, audited);
            for (f, a) in pairs {
                section.push(match a {
                    Some(a) => audited_line(a, redactor),
                    None => format!("    {NOT_CHECKED_MARKER} \"{}\" (not checked)", f.quote),
                });
            }
            for a in extra {
                section.push(audited_line(a, redactor));
            }
        }

        if !section.is_empty() {
            lines.push(dimension.title().to_string());
            lines.extend(section);
            lines.push(String::new());
        }
    }

    if !audit.new_errors.is_empty() {
        lines.push("New errors".to_string());
        for e in &audit.new_errors {
            let label = e
                .category
                .as_deref()
                .and_then(CategoryCode::parse)
                .and_then(|code| rubric.category(code))
                .map(|cat| format!("{}: ", cat.label))
                .unwrap_or_default();
            lines.push(format!(
                "  - {label}\"{}\" — {}",
                e.quote,
                redactor.scrub(&e.explanation)
            ));
        }
        lines.push(String::new());
    }

    let note = redactor.scrub(&audit.vocabulary_note);
    if !note.is_empty() {
        lines.push(Dimension::Vocabulary.title().to_string());
        lines.push(format!("  {note}"));
        lines.push(String::new());
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::MarkFormat;
    use crate::test_support::{clean_payload, instance};

    fn audited(quote: &str, status: AuditStatus, hint: Option<&str>) -> AuditedInstance {
        AuditedInstance {
            quote: quote.to_string(),
            status,
            hint: hint.map(str::to_string),
        }
    }

    fn original() -> AnnotationPayload {
        let mut payload = clean_payload();
        payload.errors.insert(
            CategoryCode::VerbTense,
            vec![
                instance("I go to Paris last year", "past simple"),
                instance("we will visiting", "future forms"),
            ],
        );
        payload.errors.insert(
            CategoryCode::Spelling,
            vec![instance("beatiful", "vowel order")],
        );
        payload
    }

    #[test]
    fn parses_reply_with_omitted_categories() {
        let json = r#"{
            "summary": "Better.",
            "errors": {
                "verb_tense": [{"quote": "I go to Paris last year", "status": "fixed"}],
                "style": [{"quote": "x", "status": "fixed"}]
            },
            "new_errors": [{"quote": "teh", "rule": "spelling"}],
            "vocabulary_note": "More varied."
        }"#;
        let audit = RevisionAudit::from_json(json, &Rubric::standard()).unwrap();
        assert_eq!(audit.errors.len(), 1);
        assert_eq!(audit.count(AuditStatus::Fixed), 1);
        assert_eq!(audit.new_errors[0].explanation, "spelling");
    }

    #[test]
    fn unknown_status_rejected() {
        let json = r#"{"errors": {"spelling": [{"quote": "x", "status": "maybe"}]}}"#;
        let err = RevisionAudit::from_json(json, &Rubric::standard()).unwrap_err();
        assert!(matches!(err, PayloadError::Json(_)));
    }

    #[test]
    fn fixed_still_present_and_new_error_each_render_once() {
        let mut errors = BTreeMap::new();
        errors.insert(
            CategoryCode::VerbTense,
            vec![audited("I go to Paris last year", AuditStatus::Fixed, None)],
        );
        errors.insert(
            CategoryCode::Spelling,
            vec![audited("beatiful", AuditStatus::StillPresent, Some("Check the vowels."))],
        );
        let audit = RevisionAudit {
            summary: "You fixed the tense problem.".to_string(),
            errors,
            new_errors: vec![NewError {
                quote: "their going".to_string(),
                explanation: "Contraction of 'they are'.".to_string(),
                category: None,
            }],
            vocabulary_note: String::new(),
        };

        let report = render_revision(&original(), &audit, &Rubric::standard(), &Redactor::default());
        let expected = "\
You fixed the tense problem.

Grammar and spelling
  Verb tenses
    ✔ \"I go to Paris last year\" (fixed)
    ? \"we will visiting\" (not checked)
  Spelling
    ✘ \"beatiful\" (still present): Check the vowels.

New errors
  - \"their going\" — Contraction of 'they are'.";
        assert_eq!(report, expected);

        assert_eq!(report.matches('✔').count(), 1);
        assert_eq!(report.matches('✘').count(), 1);
        assert_eq!(report.matches(" — ").count(), 1);
        assert!(!report.contains("/10"));
        assert_eq!(MarkFormat::default().extract(&report), None);
    }

    #[test]
    fn audited_items_follow_original_order() {
        let mut errors = BTreeMap::new();
        errors.insert(
            CategoryCode::VerbTense,
            vec![
                audited("something else", AuditStatus::StillPresent, None),
                audited("we will visiting", AuditStatus::IncorrectlyFixed, Some("Use 'will visit'-type forms.")),
                audited("I go to Paris last year", AuditStatus::Fixed, Some("ignored")),
            ],
        );
        let audit = RevisionAudit {
            summary: String::new(),
            errors,
            new_errors: Vec::new(),
            vocabulary_note: "Wider range of adjectives.".to_string(),
        };
        let report = render_revision(&original(), &audit, &Rubric::standard(), &Redactor::default());
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Grammar and spelling");
        assert!(lines[2].contains("I go to Paris last year"));
        assert!(!lines[2].contains("ignored"));
        assert!(lines[3].starts_with("    ⚠ \"we will visiting\" (incorrectly fixed): "));
        assert!(lines[4].contains("something else"));
        assert!(!report.contains("New errors"));
        assert!(!report.contains("Coherence"));
        assert!(report.ends_with("Vocabulary\n  Wider range of adjectives."));
    }

    #[test]
    fn new_error_category_shown_as_label() {
        let json = r#"{
            "new_errors": [
                {"quote": "teh trip", "explanation": "Letter order.", "category": "spelling"},
                {"quote": "so so", "explanation": "Repeated word.", "category": "style"}
            ]
        }"#;
        let audit = RevisionAudit::from_json(json, &Rubric::standard()).unwrap();
        let report = render_revision(&original(), &audit, &Rubric::standard(), &Redactor::default());
        assert!(report.contains("  - Spelling: \"teh trip\" — Letter order."));
        assert!(report.contains("  - \"so so\" — Repeated word."));
    }

    #[test]
    fn empty_audit_renders_nothing_for_a_clean_draft() {
        let audit = RevisionAudit::from_json("{}", &Rubric::standard()).unwrap();
        let report = render_revision(&clean_payload(), &audit, &Rubric::standard(), &Redactor::default());
        assert!(report.is_empty());
        assert_eq!(audit.unchecked(&clean_payload()), 0);
    }

    #[test]
    fn originals_missing_from_audit_render_as_not_checked() {
        let mut original = clean_payload();
        original.errors.insert(
            CategoryCode::Spelling,
            vec![instance("beatiful", "vowel order"), instance("freind", "i before e")],
        );
        let mut errors = BTreeMap::new();
        errors.insert(
            CategoryCode::Spelling,
            vec![audited("beatiful", AuditStatus::Fixed, None)],
        );
        let audit = RevisionAudit {
            summary: String::new(),
            errors,
            new_errors: Vec::new(),
            vocabulary_note: String::new(),
        };

        let report = render_revision(&original, &audit, &Rubric::standard(), &Redactor::default());
        assert!(report.contains("    ✔ \"beatiful\" (fixed)\n    ? \"freind\" (not checked)"));
        assert_eq!(audit.unchecked(&original), 1);
    }

    #[test]
    fn silent_audit_lists_every_original() {
        let audit = RevisionAudit::from_json("{}", &Rubric::standard()).unwrap();
        let report = render_revision(&original(), &audit, &Rubric::standard(), &Redactor::default());
        assert_eq!(report.matches("(not checked)").count(), 3);
        assert_eq!(audit.unchecked(&original()), 3);
    }
}
