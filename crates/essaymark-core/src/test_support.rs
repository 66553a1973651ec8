//! Fixtures shared by the unit tests in this crate.

use std::collections::BTreeMap;

use crate::payload::{AnnotationPayload, ErrorInstance, VocabularyLevel};
use crate::rubric::{CategoryCode, Rubric};

pub fn clean_payload_json() -> String {
    let errors: Vec<String> = Rubric::standard()
        .categories
        .iter()
        .map(|c| format!("\"{}\": []", c.code.as_str()))
        .collect();
    format!(
        r#"{{
  "impression": "A friendly, well organised email.",
  "errors": {{ {} }},
  "connectors": ["and", "but", "because", "and", "so"],
  "vocabulary": 2
}}"#,
        errors.join(", ")
    )
}

/// Clean payload with `category` set to the given JSON array.
pub fn payload_json_with(category: &str, instances: &str) -> String {
    let mut value: serde_json::Value = serde_json::from_str(&clean_payload_json()).unwrap();
    value["errors"][category] = serde_json::from_str(instances).unwrap();
    value.to_string()
}

pub fn clean_payload() -> AnnotationPayload {
    AnnotationPayload {
        impression: "A friendly, well organised email.".to_string(),
        errors: CategoryCode::ALL.into_iter().map(|c| (c, Vec::new())).collect::<BTreeMap<_, _>>(),
        connectors: ["and", "but", "because", "and", "so"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        vocabulary: VocabularyLevel::Wide,
    }
}

pub fn instance(quote: &str, explanation: &str) -> ErrorInstance {
    ErrorInstance {
        quote: quote.to_string(),
        explanation: explanation.to_string(),
    }
}

/// Add `n` numbered instances under `code`.
pub fn flag(payload: &mut AnnotationPayload, code: CategoryCode, n: usize) {
    let list = payload.errors.entry(code).or_default();
    for i in 0..n {
        list.push(instance(&format!("excerpt {i}"), "rule broken here"));
    }
}
