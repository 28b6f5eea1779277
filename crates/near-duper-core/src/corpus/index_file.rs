use super::{file_name_of, CorpusSnapshot, CorpusSource, FileRecord, SkipReason, SkippedFile};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The indexer's JSON document: an object keyed by path.
///
/// Only `"file"` entries take part; directory entries and unknown fields
/// are ignored.
#[derive(Debug, Clone)]
pub struct IndexFile {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    name: Option<String>,
    size_bytes: Option<u64>,
    modified_at: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<String>,
    content_full: Option<String>,
}

impl IndexFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusSource for IndexFile {
    fn snapshot(&self) -> Result<CorpusSnapshot> {
        let raw = fs::read(&self.path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Error reading index {}: {}", self.path.display(), e),
            )
        })?;
        let entries: BTreeMap<String, IndexEntry> =
            serde_json::from_slice(&raw).map_err(|source| Error::MalformedIndex {
                path: self.path.clone(),
                source,
            })?;

        let mut snapshot = CorpusSnapshot::default();
        for (path, entry) in entries {
            if entry.kind.as_deref().unwrap_or("file") != "file" {
                continue;
            }

            let modified_at = match entry.modified_at.as_deref().map(parse_timestamp) {
                Some(Some(ts)) => ts,
                Some(None) => {
                    warn!("Index entry '{}' has an unparsable modified_at, skipping", path);
                    snapshot.rejected.push(SkippedFile {
                        path,
                        reason: SkipReason::Rejected("invalid modified_at".into()),
                    });
                    continue;
                }
                None => {
                    debug!("Index entry '{}' has no modified_at, using the epoch", path);
                    DateTime::<Utc>::UNIX_EPOCH
                }
            };

            snapshot.records.push(FileRecord {
                name: entry.name.unwrap_or_else(|| file_name_of(&path)),
                size_bytes: entry.size_bytes.unwrap_or(0),
                modified_at,
                text_content: entry.content_full.or(entry.content),
                path,
            });
        }

        debug!(
            "Read {} file entries from {} ({} rejected)",
            snapshot.records.len(),
            self.path.display(),
            snapshot.rejected.len()
        );
        Ok(snapshot)
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_timestamp_variants() {
        let with_zone = parse_timestamp("2023-04-01T12:00:00+02:00").unwrap();
        assert_eq!(with_zone.to_rfc3339(), "2023-04-01T10:00:00+00:00");

        let naive = parse_timestamp("2023-04-01T12:00:00.250000").unwrap();
        assert_eq!(naive.timestamp(), 1_680_350_400);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_snapshot_reads_files_and_rejects_bad_entries() {
        let dir = tempdir().unwrap();
        let index_path = dir.path().join("file_index.json");
        fs::write(
            &index_path,
            r#"{
  "/data/a.txt": {"name": "a.txt", "size_bytes": 12, "modified_at": "2022-01-01T00:00:00Z",
                  "type": "file", "content": "first file", "score": 3},
  "/data/b.txt": {"size_bytes": 5, "modified_at": "2022-01-02T08:30:00", "content_full": "full",
                  "content": "preview"},
  "/data/sub": {"type": "directory", "modified_at": "2022-01-01T00:00:00Z"},
  "/data/c.txt": {"type": "file", "modified_at": "not a date", "content": "x"},
  "/data/d.pdf": {"type": "file", "modified_at": "2022-03-01T00:00:00Z"},
  "/data/e.txt": {"type": "file", "content": "undated"}
}"#,
        )
        .unwrap();

        let snapshot = IndexFile::new(&index_path).snapshot().unwrap();
        let paths: Vec<&str> = snapshot.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/data/a.txt", "/data/b.txt", "/data/d.pdf", "/data/e.txt"]
        );

        let b = &snapshot.records[1];
        assert_eq!(b.name, "b.txt");
        assert_eq!(b.text_content.as_deref(), Some("full"));
        assert!(snapshot.records[2].text_content.is_none());

        assert_eq!(snapshot.records[3].modified_at, DateTime::<Utc>::UNIX_EPOCH);

        assert_eq!(snapshot.rejected.len(), 1);
        assert_eq!(snapshot.rejected[0].path, "/data/c.txt");
        assert_eq!(
            snapshot.rejected[0].reason,
            SkipReason::Rejected("invalid modified_at".into())
        );
    }

    #[test]
    fn test_missing_index_is_an_error() {
        let dir = tempdir().unwrap();
        let err = IndexFile::new(dir.path().join("absent.json"))
            .snapshot()
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_malformed_index_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let err = IndexFile::new(&path).snapshot().unwrap_err();
        assert!(matches!(err, Error::MalformedIndex { .. }));
    }
}
