//! The marking rubric as data.
//!
//! One table drives both the prompt sent to the model and the arithmetic
//! applied to its reply, so a rubric change is a data edit rather than a
//! prompt rewrite. Two dimensions carry penalties and start at
//! [`Rubric::starting_score`]; the vocabulary dimension is a fixed
//! three-level choice read straight from the payload.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::RubricError;

/// A scored rubric axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Coherence,
    Grammar,
    Vocabulary,
}

impl Dimension {
    /// Dimensions that start at the rubric's starting score and lose points per category.
    pub const PENALTY_BEARING: [Dimension; 2] = [Dimension::Coherence, Dimension::Grammar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coherence => "coherence",
            Self::Grammar => "grammar",
            Self::Vocabulary => "vocabulary",
        }
    }

    /// Heading used in rendered reports.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Coherence => "Coherence and organisation",
            Self::Grammar => "Grammar and spelling",
            Self::Vocabulary => "Vocabulary",
        }
    }

    pub fn max_score(&self) -> f64 {
        match self {
            Self::Coherence | Self::Grammar => 4.0,
            Self::Vocabulary => 2.0,
        }
    }
}

/// How a category's instances turn into a deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Weight is subtracted once per flagged instance.
    PerOccurrence,
    /// Weight is subtracted once if anything at all is flagged.
    CountOnce,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerOccurrence => "per_occurrence",
            Self::CountOnce => "count_once",
        }
    }
}

/// Closed set of error categories the model may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryCode {
    MissingContent,
    UnclearSentence,
    Paragraphing,
    Register,
    SubjectVerbAgreement,
    VerbTense,
    WordOrder,
    ArticlesPrepositions,
    Spelling,
    Capitalisation,
    Punctuation,
}

impl CategoryCode {
    pub const ALL: [CategoryCode; 11] = [
        Self::MissingContent,
        Self::UnclearSentence,
        Self::Paragraphing,
        Self::Register,
        Self::SubjectVerbAgreement,
        Self::VerbTense,
        Self::WordOrder,
        Self::ArticlesPrepositions,
        Self::Spelling,
        Self::Capitalisation,
        Self::Punctuation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingContent => "missing_content",
            Self::UnclearSentence => "unclear_sentence",
            Self::Paragraphing => "paragraphing",
            Self::Register => "register",
            Self::SubjectVerbAgreement => "subject_verb_agreement",
            Self::VerbTense => "verb_tense",
            Self::WordOrder => "word_order",
            Self::ArticlesPrepositions => "articles_prepositions",
            Self::Spelling => "spelling",
            Self::Capitalisation => "capitalisation",
            Self::Punctuation => "punctuation",
        }
    }

    /// Look up a code by its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// One rubric infraction type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCategory {
    pub code: CategoryCode,
    pub dimension: Dimension,
    pub weight: f64,
    pub aggregation: Aggregation,
    /// Heading shown above this category's instances in feedback.
    pub label: String,
    /// Instruction given to the model describing what belongs here.
    pub rule: String,
}

/// Linking-word coverage check applied to the coherence dimension.
///
/// Triggers when either minimum is missed; the penalty applies once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRule {
    pub min_total: usize,
    pub min_distinct: usize,
    pub penalty: f64,
}

/// Word-count thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthRule {
    /// Essays at or below this many words are not marked at all.
    pub too_short_max: usize,
    /// Essays below this many words have their total halved.
    pub full_length_min: usize,
}

impl LengthRule {
    pub fn is_too_short(&self, word_count: usize) -> bool {
        word_count <= self.too_short_max
    }

    pub fn is_under_length(&self, word_count: usize) -> bool {
        word_count < self.full_length_min
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub starting_score: f64,
    /// Ordered: reports list categories in this order.
    pub categories: Vec<ErrorCategory>,
    pub connectors: ConnectorRule,
    pub length: LengthRule,
}

impl Default for Rubric {
    fn default() -> Self {
        Self::standard()
    }
}

fn category(
    code: CategoryCode,
    dimension: Dimension,
    weight: f64,
    aggregation: Aggregation,
    label: &str,
    rule: &str,
) -> ErrorCategory {
    ErrorCategory {
        code,
        dimension,
        weight,
        aggregation,
        label: label.to_string(),
        rule: rule.to_string(),
    }
}

impl Rubric {
    /// The built-in rubric.
    pub fn standard() -> Self {
        use Aggregation::{CountOnce, PerOccurrence};
        use CategoryCode::*;
        use Dimension::{Coherence, Grammar};

        Self {
            starting_score: 4.0,
            categories: vec![
                category(
                    MissingContent,
                    Coherence,
                    1.0,
                    PerOccurrence,
                    "Required content not covered",
                    "One entry per required content point the essay does not address. \
                     Quote the sentence closest to where it belongs.",
                ),
                category(
                    UnclearSentence,
                    Coherence,
                    0.5,
                    PerOccurrence,
                    "Unclear or confusing sentences",
                    "Sentences whose meaning a reader cannot follow.",
                ),
                category(
                    Paragraphing,
                    Coherence,
                    0.5,
                    CountOnce,
                    "Paragraphing and layout",
                    "Missing paragraph breaks, or ideas not grouped into paragraphs.",
                ),
                category(
                    Register,
                    Coherence,
                    0.5,
                    CountOnce,
                    "Register and text format",
                    "Greeting, closing or tone that does not fit the text type requested.",
                ),
                category(
                    SubjectVerbAgreement,
                    Grammar,
                    0.5,
                    PerOccurrence,
                    "Subject-verb agreement",
                    "Verb form that does not agree with its subject.",
                ),
                category(
                    VerbTense,
                    Grammar,
                    0.5,
                    PerOccurrence,
                    "Verb tenses",
                    "Wrong tense or wrongly formed verb phrase.",
                ),
                category(
                    WordOrder,
                    Grammar,
                    0.25,
                    PerOccurrence,
                    "Word order",
                    "Words in an ungrammatical order.",
                ),
                category(
                    ArticlesPrepositions,
                    Grammar,
                    0.25,
                    PerOccurrence,
                    "Articles and prepositions",
                    "Missing, extra or wrong article or preposition.",
                ),
                category(
                    Spelling,
                    Grammar,
                    0.25,
                    PerOccurrence,
                    "Spelling",
                    "Misspelt words.",
                ),
                category(
                    Capitalisation,
                    Grammar,
                    0.25,
                    CountOnce,
                    "Capital letters",
                    "Missing or wrong capital letters.",
                ),
                category(
                    Punctuation,
                    Grammar,
                    0.25,
                    CountOnce,
                    "Punctuation",
                    "Missing or wrong punctuation.",
                ),
            ],
            connectors: ConnectorRule {
                min_total: 5,
                min_distinct: 3,
                penalty: 1.0,
            },
            length: LengthRule {
                too_short_max: 65,
                full_length_min: 80,
            },
        }
    }

    /// Parse and validate a rubric table from JSON.
    pub fn from_json(json: &str) -> Result<Self, RubricError> {
        let rubric: Rubric = serde_json::from_str(json)?;
        rubric.validate()?;
        Ok(rubric)
    }

    pub fn validate(&self) -> Result<(), RubricError> {
        if self.starting_score.is_nan() || self.starting_score <= 0.0 {
            return Err(RubricError::Other(format!(
                "starting score must be positive, got {}",
                self.starting_score
            )));
        }
        if self.connectors.penalty < 0.0 {
            return Err(RubricError::Other(
                "connector penalty must not be negative".to_string(),
            ));
        }
        if self.length.too_short_max >= self.length.full_length_min {
            return Err(RubricError::Other(format!(
                "too-short threshold ({}) must be below the full-length threshold ({})",
                self.length.too_short_max, self.length.full_length_min
            )));
        }

        let mut seen = HashSet::new();
        for cat in &self.categories {
            if !seen.insert(cat.code) {
                return Err(RubricError::DuplicateCategory(cat.code));
            }
            if cat.weight.is_nan() || cat.weight < 0.0 {
                return Err(RubricError::NegativeWeight(cat.code));
            }
            if !Dimension::PENALTY_BEARING.contains(&cat.dimension) {
                return Err(RubricError::UnscoredDimension(cat.code));
            }
        }
        Ok(())
    }

    /// Categories owned by `dimension`, in table order.
    pub fn categories_for(&self, dimension: Dimension) -> impl Iterator<Item = &ErrorCategory> {
        self.categories
            .iter()
            .filter(move |c| c.dimension == dimension)
    }

    pub fn category(&self, code: CategoryCode) -> Option<&ErrorCategory> {
        self.categories.iter().find(|c| c.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rubric_is_valid() {
        Rubric::standard().validate().unwrap();
    }

    #[test]
    fn standard_rubric_covers_every_code_once() {
        let rubric = Rubric::standard();
        assert_eq!(rubric.categories.len(), CategoryCode::ALL.len());
        for code in CategoryCode::ALL {
            assert!(rubric.category(code).is_some(), "missing {}", code.as_str());
        }
    }

    #[test]
    fn categories_for_keeps_table_order() {
        let rubric = Rubric::standard();
        let coherence: Vec<_> = rubric
            .categories_for(Dimension::Coherence)
            .map(|c| c.code)
            .collect();
        assert_eq!(
            coherence,
            vec![
                CategoryCode::MissingContent,
                CategoryCode::UnclearSentence,
                CategoryCode::Paragraphing,
                CategoryCode::Register,
            ]
        );
        assert_eq!(rubric.categories_for(Dimension::Grammar).count(), 7);
        assert_eq!(rubric.categories_for(Dimension::Vocabulary).count(), 0);
    }

    #[test]
    fn code_wire_names_parse_back() {
        for code in CategoryCode::ALL {
            assert_eq!(CategoryCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(CategoryCode::parse("grammar"), None);
    }

    #[test]
    fn serialized_codes_match_wire_names() {
        let json = serde_json::to_string(&CategoryCode::SubjectVerbAgreement).unwrap();
        assert_eq!(json, "\"subject_verb_agreement\"");
    }

    #[test]
    fn rubric_file_loads() {
        let json = serde_json::to_string(&Rubric::standard()).unwrap();
        let loaded = Rubric::from_json(&json).unwrap();
        assert_eq!(loaded, Rubric::standard());
    }

    #[test]
    fn duplicate_category_rejected() {
        let mut rubric = Rubric::standard();
        let first = rubric.categories[0].clone();
        rubric.categories.push(first);
        assert!(matches!(
            rubric.validate(),
            Err(RubricError::DuplicateCategory(CategoryCode::MissingContent))
        ));
    }

    #[test]
    fn negative_weight_rejected() {
        let mut rubric = Rubric::standard();
        rubric.categories[4].weight = -0.5;
        assert!(matches!(
            rubric.validate(),
            Err(RubricError::NegativeWeight(CategoryCode::SubjectVerbAgreement))
        ));
    }

    #[test]
    fn vocabulary_categories_rejected() {
        let mut rubric = Rubric::standard();
        rubric.categories[0].dimension = Dimension::Vocabulary;
        assert!(matches!(
            rubric.validate(),
            Err(RubricError::UnscoredDimension(_))
        ));
    }

    #[test]
    fn inverted_length_thresholds_rejected() {
        let mut rubric = Rubric::standard();
        rubric.length.too_short_max = 90;
        assert!(rubric.validate().is_err());
    }

    #[test]
    fn length_rule_boundaries() {
        let length = Rubric::standard().length;
        assert!(length.is_too_short(65));
        assert!(!length.is_too_short(66));
        assert!(length.is_under_length(79));
        assert!(!length.is_under_length(80));
    }
}
