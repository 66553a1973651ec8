//! Text helpers shared by scoring and rendering.

use std::sync::OnceLock;

use regex::Regex;

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

static LEVEL_LABEL: OnceLock<Regex> = OnceLock::new();
static SPACE_RUN: OnceLock<Regex> = OnceLock::new();

fn level_label_re() -> &'static Regex {
    LEVEL_LABEL.get_or_init(|| {
        Regex::new(
            r"\b(?:CEFR\s+)?(?:(?i:level)\s+)?(?:(?i:pre)-)?[ABC][12](?:\+|\b)(?:\s+(?i:level)\b)?|\bCEFR\b",
        )
        .expect("level label pattern is valid")
    })
}

fn space_run_re() -> &'static Regex {
    SPACE_RUN.get_or_init(|| Regex::new(r"[ \t]{2,}").expect("space run pattern is valid"))
}

/// Best-effort scrub of student names and proficiency-level labels.
///
/// Applied to the model's own prose (impressions, explanations, hints), never
/// to quoted excerpts of the student's text. Names and level codes match
/// case-sensitively, so "will" survives a student called Will and a room
/// "a2" survives level scrubbing.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    names: Option<Regex>,
}

impl Redactor {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let alternatives: Vec<String> = names
            .iter()
            .flat_map(|n| n.as_ref().split_whitespace())
            .filter(|part| part.chars().count() > 1)
            .map(regex::escape)
            .collect();

        let names = if alternatives.is_empty() {
            None
        } else {
            Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).ok()
        };
        Self { names }
    }

    pub fn scrub(&self, text: &str) -> String {
        let mut out = level_label_re().replace_all(text, "").into_owned();
        if let Some(names) = &self.names {
            out = names.replace_all(&out, "the student").into_owned();
        }
        let out = space_run_re().replace_all(&out, " ");
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_whitespace_tokens() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("Hi Liam,\n\nI am   going to Paris."), 7);
    }

    #[test]
    fn scrubs_capitalised_names() {
        let r = Redactor::new(&["Maria Lopez", "Tom"]);
        assert_eq!(
            r.scrub("Well done, Maria! Tom and Lopez wrote well."),
            "Well done, the student! the student and the student wrote well."
        );
    }

    #[test]
    fn common_word_names_leave_ordinary_words() {
        let r = Redactor::new(&["Will Smith", "May", "Grace"]);
        assert_eq!(r.scrub("we will visiting"), "we will visiting");
        assert_eq!(r.scrub("You may add more grace notes."), "You may add more grace notes.");
        assert_eq!(r.scrub("Good work, Will."), "Good work, the student.");
    }

    #[test]
    fn names_only_match_whole_words() {
        let r = Redactor::new(&["Tom"]);
        assert_eq!(r.scrub("Tomorrow we go."), "Tomorrow we go.");
    }

    #[test]
    fn scrubs_level_labels() {
        let r = Redactor::default();
        assert_eq!(r.scrub("This is a solid B1 essay."), "This is a solid essay.");
        assert_eq!(
            r.scrub("Writing at CEFR level A2+ overall."),
            "Writing at overall."
        );
        assert_eq!(r.scrub("Typical of A2 Level writers."), "Typical of writers.");
    }

    #[test]
    fn lowercase_codes_are_not_levels() {
        let r = Redactor::default();
        assert_eq!(r.scrub("Meet me in room a2 or c1."), "Meet me in room a2 or c1.");
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let r = Redactor::new(&["Ana"]);
        let text = "Use \"because\" to explain reasons.";
        assert_eq!(r.scrub(text), text);
    }

    #[test]
    fn empty_names_ignored() {
        let r = Redactor::new(&["", " "]);
        assert_eq!(r.scrub("a b"), "a b");
    }
}
