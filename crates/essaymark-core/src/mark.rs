//! Display and extraction of marks.
//!
//! The final line of every marked report is `<label> <n>/10`, e.g.
//! `FINAL MARK: 3,8/10`. Whole numbers drop the decimal part (`0/10`).
//! Extraction accepts either decimal separator so records written under a
//! different locale setting still parse.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::score::round_one_decimal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkFormat {
    pub label: String,
    pub decimal_separator: char,
}

impl Default for MarkFormat {
    fn default() -> Self {
        Self {
            label: "FINAL MARK:".to_string(),
            decimal_separator: ',',
        }
    }
}

impl MarkFormat {
    /// `3.75` → `3,8`; `8.0` → `8`.
    pub fn format_number(&self, value: f64) -> String {
        let rounded = round_one_decimal(value);
        if rounded.fract() == 0.0 {
            format!("{}", rounded as i64)
        } else {
            format!("{rounded:.1}").replace('.', &self.decimal_separator.to_string())
        }
    }

    /// `3,5/4`
    pub fn format_score(&self, value: f64, max: f64) -> String {
        format!("{}/{}", self.format_number(value), self.format_number(max))
    }

    /// `3,8/10`
    pub fn mark_value(&self, total: f64) -> String {
        self.format_score(total, 10.0)
    }

    /// `FINAL MARK: 3,8/10`
    pub fn mark_line(&self, total: f64) -> String {
        format!("{} {}", self.label, self.mark_value(total))
    }

    fn pattern(&self) -> Option<Regex> {
        Regex::new(&format!(
            r"(?i){}\s*(\d+(?:[.,]\d+)?)\s*/\s*10\b",
            regex::escape(self.label.trim())
        ))
        .ok()
    }

    /// The last mark in `text`, as written (`3,8/10`).
    pub fn extract_value(&self, text: &str) -> Option<String> {
        let re = self.pattern()?;
        let caps = re.captures_iter(text).last()?;
        Some(format!("{}/10", &caps[1]))
    }

    /// The last mark in `text`, as a number.
    pub fn extract(&self, text: &str) -> Option<f64> {
        let re = self.pattern()?;
        let caps = re.captures_iter(text).last()?;
        caps[1].replace(',', ".").parse().ok()
    }
}
