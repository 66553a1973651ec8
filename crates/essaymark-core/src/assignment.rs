use serde::{Deserialize, Serialize};

/// The writing task students answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assignment {
    pub name: String,
    pub instructions: String,
    /// Points the essay must cover; a missing one is a `missing_content` error.
    pub content_points: Vec<String>,
    /// Class groups allowed to submit. Empty means any.
    pub groups: Vec<String>,
}

impl Default for Assignment {
    fn default() -> Self {
        Self {
            name: "Email to Liam (End of Year Trip)".to_string(),
            instructions: "Write an email to Liam (80-100 words). Tell him about your end of \
                           year trip plans: places to visit, activities, classmates, friends \
                           and family."
                .to_string(),
            content_points: vec![
                "places to visit".to_string(),
                "activities".to_string(),
                "classmates, friends and family".to_string(),
            ],
            groups: ["3A", "3C", "4A", "4B", "4C"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
        }
    }
}

impl Assignment {
    pub fn accepts_group(&self, group: &str) -> bool {
        self.groups.is_empty() || self.groups.iter().any(|g| g == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_groups_are_enforced() {
        let a = Assignment::default();
        assert!(a.accepts_group("4B"));
        assert!(!a.accepts_group("5A"));
    }

    #[test]
    fn empty_group_list_accepts_anyone() {
        let a = Assignment {
            groups: Vec::new(),
            ..Assignment::default()
        };
        assert!(a.accepts_group("anything"));
    }
}
