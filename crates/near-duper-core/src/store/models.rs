use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Member of a duplicate group as persisted and shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

/// A cluster of files judged mutually near-duplicate. Keyed by group id in
/// the store, so the id itself is not part of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub avg_similarity: f64,
    /// `"{start}-{end}"` in normalized characters.
    pub length_range: String,
    pub file_count: usize,
    pub files: Vec<FileSummary>,
}

impl DuplicateGroup {
    pub fn new(avg_similarity: f64, length_range: String, files: Vec<FileSummary>) -> Self {
        Self {
            avg_similarity,
            length_range,
            file_count: files.len(),
            files,
        }
    }

    /// Numeric start of `length_range`; malformed ranges sort first.
    pub fn length_start(&self) -> u64 {
        self.length_range
            .split('-')
            .next()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// A group together with its id, as returned by searches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEntry {
    pub group_id: String,
    #[serde(flatten)]
    pub group: DuplicateGroup,
}
