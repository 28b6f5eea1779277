//! Text preparation: normalization and shingle extraction.

mod shingle;

pub use shingle::shingles;

use serde::{Deserialize, Serialize};

/// How extracted text is cleaned before shingling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Lowercase and collapse whitespace runs into a single space.
    #[default]
    Collapse,
    /// Lowercase, drop punctuation and remove all whitespace.
    Strip,
    /// Use the text exactly as extracted.
    Verbatim,
}

pub fn normalize(text: &str, policy: Normalization) -> String {
    match policy {
        Normalization::Collapse => {
            let mut out = String::with_capacity(text.len());
            for word in text.split_whitespace() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.extend(word.chars().flat_map(char::to_lowercase));
            }
            out
        }
        Normalization::Strip => text
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .flat_map(char::to_lowercase)
            .collect(),
        Normalization::Verbatim => text.to_string(),
    }
}

/// Length in characters, which is what buckets and shingles are measured in.
pub fn char_length(text: &str) -> usize {
    text.chars().count()
}
