use serde::{Deserialize, Serialize};

use super::instruction::{
    is_known_category, MAX_CATEGORIES, MAX_DESCRIPTION_CHARS, MAX_KEYWORDS, MIN_CATEGORIES,
    MIN_KEYWORDS,
};

pub const YES: &str = "yes";
pub const NO: &str = "no";

/// Stock metadata for one image, as returned by the model.
///
/// Field names match the JSON keys the model is instructed to produce.
/// `keywords` and `categories` stay comma-joined strings so they export
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMetadata {
    pub description: String,
    pub keywords: String,
    pub categories: String,
    pub editorial: String,
    pub mature_content: String,
    pub illustration: String,
}

impl Default for StockMetadata {
    /// Neutral values carried by failed records.
    fn default() -> Self {
        Self {
            description: String::new(),
            keywords: String::new(),
            categories: String::new(),
            editorial: NO.to_string(),
            mature_content: NO.to_string(),
            illustration: NO.to_string(),
        }
    }
}

impl StockMetadata {
    pub fn keyword_list(&self) -> Vec<&str> {
        split_list(&self.keywords)
    }

    pub fn category_list(&self) -> Vec<&str> {
        split_list(&self.categories)
    }

    /// Checks the record against the instruction contract. An empty list
    /// means the record conforms.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let description_len = self.description.chars().count();
        if description_len == 0 {
            issues.push("description is empty".to_string());
        } else if description_len > MAX_DESCRIPTION_CHARS {
            issues.push(format!(
                "description has {} characters (max {})",
                description_len, MAX_DESCRIPTION_CHARS
            ));
        }

        let keyword_count = self.keyword_list().len();
        if !(MIN_KEYWORDS..=MAX_KEYWORDS).contains(&keyword_count) {
            issues.push(format!(
                "expected {}-{} keywords, got {}",
                MIN_KEYWORDS, MAX_KEYWORDS, keyword_count
            ));
        }

        let categories = self.category_list();
        if !(MIN_CATEGORIES..=MAX_CATEGORIES).contains(&categories.len()) {
            issues.push(format!(
                "expected {}-{} categories, got {}",
                MIN_CATEGORIES,
                MAX_CATEGORIES,
                categories.len()
            ));
        }
        for category in categories.iter().filter(|c| !is_known_category(c)) {
            issues.push(format!("unknown category '{}'", category));
        }

        for (field, value) in [
            ("editorial", &self.editorial),
            ("mature_content", &self.mature_content),
            ("illustration", &self.illustration),
        ] {
            if !is_flag(value) {
                issues.push(format!("{} must be \"yes\" or \"no\", got '{}'", field, value));
            }
        }

        issues
    }
}

fn split_list(joined: &str) -> Vec<&str> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_flag(value: &str) -> bool {
    value == YES || value == NO
}
