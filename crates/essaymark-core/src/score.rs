//! Rubric arithmetic: annotation payload + word count → marks.
//!
//! # Algorithm
//!
//! 1. Each penalty-bearing dimension starts at [`Rubric::starting_score`].
//! 2. Every category subtracts its weight per instance (`per_occurrence`) or
//!    once if it has any instance (`count_once`).
//! 3. Coherence alone loses the connector penalty, once, when the essay has
//!    too few linking words in total or too few distinct ones.
//! 4. Each dimension is clamped at 0.
//! 5. Total = coherence + grammar + vocabulary, halved below the full-length
//!    word count, then rounded.
//!
//! Rounding is to one decimal, half away from zero, applied once to each
//! reported value. The total is built from unrounded dimension scores.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::payload::{AnnotationPayload, ErrorInstance};
use crate::rubric::{Aggregation, ConnectorRule, Dimension, ErrorCategory, Rubric};

/// Marks for one essay. Derived, never stored apart from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub coherence: f64,
    pub grammar: f64,
    pub vocabulary: f64,
    /// Out of 10.
    pub total: f64,
    /// The connector rule fired on the coherence dimension.
    pub connector_penalty: bool,
    /// The essay was under the full-length word count and the total was halved.
    pub length_penalty: bool,
}

impl ScoreResult {
    pub fn dimension(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Coherence => self.coherence,
            Dimension::Grammar => self.grammar,
            Dimension::Vocabulary => self.vocabulary,
        }
    }
}

/// Score a validated payload. Pure: same inputs, same result.
pub fn compute_score(payload: &AnnotationPayload, word_count: usize, rubric: &Rubric) -> ScoreResult {
    let connector_penalty = connector_shortfall(&payload.connectors, &rubric.connectors);

    let mut coherence = rubric.starting_score - deductions(payload, rubric, Dimension::Coherence);
    if connector_penalty {
        coherence -= rubric.connectors.penalty;
    }
    let coherence = coherence.max(0.0);
    let grammar = (rubric.starting_score - deductions(payload, rubric, Dimension::Grammar)).max(0.0);
    let vocabulary = payload.vocabulary.score();

    let length_penalty = rubric.length.is_under_length(word_count);
    let mut total = coherence + grammar + vocabulary;
    if length_penalty {
        total /= 2.0;
    }

    ScoreResult {
        coherence: round_one_decimal(coherence),
        grammar: round_one_decimal(grammar),
        vocabulary,
        total: round_one_decimal(total),
        connector_penalty,
        length_penalty,
    }
}

fn deductions(payload: &AnnotationPayload, rubric: &Rubric, dimension: Dimension) -> f64 {
    rubric
        .categories_for(dimension)
        .map(|cat| category_deduction(cat, payload.instances(cat.code)))
        .sum()
}

fn category_deduction(category: &ErrorCategory, instances: &[ErrorInstance]) -> f64 {
    match category.aggregation {
        Aggregation::PerOccurrence => category.weight * instances.len() as f64,
        Aggregation::CountOnce if instances.is_empty() => 0.0,
        Aggregation::CountOnce => category.weight,
    }
}

/// True when the essay misses either connector minimum. Distinctness is
/// exact, case-sensitive token equality.
pub fn connector_shortfall(connectors: &[String], rule: &ConnectorRule) -> bool {
    let distinct: HashSet<&str> = connectors.iter().map(String::as_str).collect();
    connectors.len() < rule.min_total || distinct.len() < rule.min_distinct
}

/// One decimal place, half away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::VocabularyLevel;
    use crate::rubric::CategoryCode;
    use crate::test_support::{clean_payload, flag};

    fn connectors(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clean_essay_keeps_full_dimension_scores() {
        let score = compute_score(&clean_payload(), 95, &Rubric::standard());
        assert_eq!(score.coherence, 4.0);
        assert_eq!(score.grammar, 4.0);
        assert_eq!(score.vocabulary, 2.0);
        assert_eq!(score.total, 10.0);
        assert!(!score.connector_penalty);
        assert!(!score.length_penalty);
    }

    #[test]
    fn per_occurrence_categories_deduct_per_instance() {
        let mut payload = clean_payload();
        flag(&mut payload, CategoryCode::Spelling, 3);
        flag(&mut payload, CategoryCode::VerbTense, 2);
        let score = compute_score(&payload, 90, &Rubric::standard());
        // 4 - 3 * 0.25 - 2 * 0.5
        assert_eq!(score.grammar, 2.3);
        // 4 + 2.25 + 2
        assert_eq!(score.total, 8.3);
    }

    #[test]
    fn count_once_categories_deduct_once() {
        let mut payload = clean_payload();
        flag(&mut payload, CategoryCode::Paragraphing, 4);
        flag(&mut payload, CategoryCode::Punctuation, 6);
        let score = compute_score(&payload, 90, &Rubric::standard());
        assert_eq!(score.coherence, 3.5);
        assert_eq!(score.grammar, 3.8);
        assert_eq!(score.total, 9.3);
    }

    #[test]
    fn dimension_scores_never_negative() {
        let mut payload = clean_payload();
        flag(&mut payload, CategoryCode::MissingContent, 12);
        flag(&mut payload, CategoryCode::SubjectVerbAgreement, 40);
        payload.connectors.clear();
        payload.vocabulary = VocabularyLevel::Limited;
        let score = compute_score(&payload, 120, &Rubric::standard());
        assert_eq!(score.coherence, 0.0);
        assert_eq!(score.grammar, 0.0);
        assert_eq!(score.total, 0.0);
    }

    #[test]
    fn connector_rule_applies_once_when_both_minimums_missed() {
        let mut payload = clean_payload();
        payload.connectors = connectors(&["but", "however", "but"]);
        let score = compute_score(&payload, 90, &Rubric::standard());
        assert!(score.connector_penalty);
        assert_eq!(score.coherence, 3.0);
    }

    #[test]
    fn connector_rule_fires_on_total_alone() {
        let rule = Rubric::standard().connectors;
        assert!(connector_shortfall(&connectors(&["and", "but", "so", "because"]), &rule));
    }

    #[test]
    fn connector_rule_fires_on_distinct_alone() {
        let rule = Rubric::standard().connectors;
        assert!(connector_shortfall(
            &connectors(&["and", "and", "and", "but", "but"]),
            &rule
        ));
    }

    #[test]
    fn connector_distinctness_is_case_sensitive() {
        let rule = Rubric::standard().connectors;
        assert!(!connector_shortfall(
            &connectors(&["And", "and", "AND", "but", "but"]),
            &rule
        ));
    }

    #[test]
    fn short_essay_total_is_halved_and_rounded_half_up() {
        let mut payload = clean_payload();
        flag(&mut payload, CategoryCode::MissingContent, 1);
        flag(&mut payload, CategoryCode::VerbTense, 1);
        payload.vocabulary = VocabularyLevel::Adequate;
        let score = compute_score(&payload, 70, &Rubric::standard());
        assert_eq!(score.coherence, 3.0);
        assert_eq!(score.grammar, 3.5);
        assert_eq!(score.vocabulary, 1.0);
        // 7.5 / 2 = 3.75
        assert_eq!(score.total, 3.8);
        assert!(score.length_penalty);
    }

    #[test]
    fn halving_never_applies_at_the_threshold() {
        let mut payload = clean_payload();
        flag(&mut payload, CategoryCode::MissingContent, 1);
        flag(&mut payload, CategoryCode::VerbTense, 1);
        payload.vocabulary = VocabularyLevel::Adequate;
        let rubric = Rubric::standard();

        let at = compute_score(&payload, 80, &rubric);
        assert_eq!(at.total, 7.5);
        assert!(!at.length_penalty);

        let below = compute_score(&payload, 79, &rubric);
        assert_eq!(below.total, 3.8);
    }

    #[test]
    fn total_uses_unrounded_dimensions() {
        let mut payload = clean_payload();
        flag(&mut payload, CategoryCode::Spelling, 1);
        flag(&mut payload, CategoryCode::WordOrder, 1);
        flag(&mut payload, CategoryCode::UnclearSentence, 1);
        flag(&mut payload, CategoryCode::Capitalisation, 1);
        let score = compute_score(&payload, 85, &Rubric::standard());
        // coherence 3.5, grammar 3.25 → reported 3.3, total 3.5 + 3.25 + 2
        assert_eq!(score.grammar, 3.3);
        assert_eq!(score.total, 8.8);
    }

    #[test]
    fn scoring_is_deterministic() {
        let mut payload = clean_payload();
        flag(&mut payload, CategoryCode::Register, 1);
        flag(&mut payload, CategoryCode::ArticlesPrepositions, 2);
        let rubric = Rubric::standard();
        assert_eq!(
            compute_score(&payload, 77, &rubric),
            compute_score(&payload, 77, &rubric)
        );
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_one_decimal(3.75), 3.8);
        assert_eq!(round_one_decimal(3.25), 3.3);
        assert_eq!(round_one_decimal(4.125), 4.1);
        assert_eq!(round_one_decimal(0.0), 0.0);
    }
}
