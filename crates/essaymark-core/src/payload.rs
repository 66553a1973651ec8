//! The structured error annotation returned by the model for one essay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PayloadError;
use crate::rubric::{CategoryCode, Rubric};

/// One flagged excerpt of the student's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInstance {
    /// Literal excerpt from the essay.
    pub quote: String,
    /// The rule that was broken. Never the corrected form.
    #[serde(alias = "rule")]
    pub explanation: String,
}

/// Vocabulary range, the third rubric dimension.
///
/// On the wire this is the bare number 0, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum VocabularyLevel {
    Limited,
    Adequate,
    Wide,
}

impl VocabularyLevel {
    pub const ALL: [VocabularyLevel; 3] = [Self::Limited, Self::Adequate, Self::Wide];

    pub fn score(&self) -> f64 {
        match self {
            Self::Limited => 0.0,
            Self::Adequate => 1.0,
            Self::Wide => 2.0,
        }
    }

    /// Qualitative description, used in prompts and feedback.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Limited => "Basic, repetitive vocabulary.",
            Self::Adequate => "Adequate vocabulary for the task, with some variety.",
            Self::Wide => "Wide and precise vocabulary for the task.",
        }
    }
}

impl TryFrom<f64> for VocabularyLevel {
    type Error = PayloadError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|level| level.score() == value)
            .ok_or(PayloadError::InvalidVocabulary(value))
    }
}

impl From<VocabularyLevel> for f64 {
    fn from(level: VocabularyLevel) -> f64 {
        level.score()
    }
}

/// Full model assessment of one essay, validated against a [`Rubric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    pub impression: String,
    /// Every category of the rubric is present, possibly with no instances.
    pub errors: BTreeMap<CategoryCode, Vec<ErrorInstance>>,
    /// Linking words the essay uses, one entry per occurrence.
    pub connectors: Vec<String>,
    pub vocabulary: VocabularyLevel,
}

#[derive(Deserialize)]
struct RawAnnotation {
    #[serde(default)]
    impression: String,
    errors: BTreeMap<String, Vec<ErrorInstance>>,
    connectors: Vec<String>,
    vocabulary: f64,
}

impl AnnotationPayload {
    /// Parse a model reply and check it against the rubric.
    ///
    /// Unknown category keys are dropped; a rubric category missing from the
    /// reply rejects the whole payload.
    pub fn from_json(json: &str, rubric: &Rubric) -> Result<Self, PayloadError> {
        let raw: RawAnnotation = serde_json::from_str(json)?;

        let mut errors = BTreeMap::new();
        for (key, instances) in raw.errors {
            match CategoryCode::parse(&key) {
                Some(code) if rubric.category(code).is_some() => {
                    errors.insert(code, instances);
                }
                _ => warn!(category = %key, "ignoring error category not in rubric"),
            }
        }

        for cat in &rubric.categories {
            if !errors.contains_key(&cat.code) {
                return Err(PayloadError::MissingCategory(cat.code));
            }
        }

        Ok(Self {
            impression: raw.impression,
            errors,
            connectors: raw.connectors,
            vocabulary: VocabularyLevel::try_from(raw.vocabulary)?,
        })
    }

    /// Instances flagged under `code`; empty if none.
    pub fn instances(&self, code: CategoryCode) -> &[ErrorInstance] {
        self.errors.get(&code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_instances(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }
}
