//! The boundary with the indexer: what a dedupe run consumes.

mod index_file;

pub use index_file::IndexFile;

use crate::error::Result;
use crate::store::FileSummary;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

/// One indexed file as supplied by the indexer for a single run.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
    /// Extracted text. `None` when the indexer could not extract any.
    pub text_content: Option<String>,
}

impl FileRecord {
    /// Record for in-memory text; name and size are derived from the inputs.
    pub fn from_text(path: impl Into<String>, text: impl Into<String>) -> Self {
        let path = path.into();
        let text = text.into();
        Self {
            name: file_name_of(&path),
            size_bytes: text.len() as u64,
            modified_at: Utc::now(),
            text_content: Some(text),
            path,
        }
    }

    pub fn with_modified_at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = modified_at;
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            path: self.path.clone(),
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            modified_at: self.modified_at,
        }
    }
}

pub(crate) fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Why a file took no part in a run. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The indexer supplied no text.
    NoContent,
    /// Normalized text is shorter than one shingle.
    TooShort { length: usize, shingle_length: usize },
    /// The index entry itself was unusable.
    Rejected(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoContent => write!(f, "no extracted text"),
            SkipReason::TooShort {
                length,
                shingle_length,
            } => write!(
                f,
                "too short to compare ({} chars, shingle length {})",
                length, shingle_length
            ),
            SkipReason::Rejected(why) => write!(f, "rejected: {}", why),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// Everything the indexer handed over for one run.
#[derive(Debug, Clone, Default)]
pub struct CorpusSnapshot {
    pub records: Vec<FileRecord>,
    /// Entries dropped before the engine saw them.
    pub rejected: Vec<SkippedFile>,
}

/// Supplies the current corpus at `compute()` time.
pub trait CorpusSource {
    fn snapshot(&self) -> Result<CorpusSnapshot>;
}

impl CorpusSource for Vec<FileRecord> {
    fn snapshot(&self) -> Result<CorpusSnapshot> {
        Ok(CorpusSnapshot {
            records: self.clone(),
            rejected: Vec::new(),
        })
    }
}

impl CorpusSource for CorpusSnapshot {
    fn snapshot(&self) -> Result<CorpusSnapshot> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_derives_name_and_size() {
        let record = FileRecord::from_text("/docs/reports/q1.txt", "hello");
        assert_eq!(record.name, "q1.txt");
        assert_eq!(record.size_bytes, 5);
        assert_eq!(record.text_content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::TooShort {
            length: 3,
            shingle_length: 5,
        };
        assert!(reason.to_string().starts_with("too short to compare"));
    }
}
