//! Old-file detection over the indexed corpus.

use crate::config::OldFileSettings;
use crate::corpus::FileRecord;
use crate::store::FileSummary;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OldFilesSortBy {
    #[default]
    Age,
    Size,
}

/// `Normal` lists the oldest (or smallest) file first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OldFilesOrder {
    #[default]
    Normal,
    Inverted,
}

impl FromStr for OldFilesSortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "age" => Ok(OldFilesSortBy::Age),
            "size" => Ok(OldFilesSortBy::Size),
            other => Err(format!("unknown sort key '{}' (expected age or size)", other)),
        }
    }
}

impl FromStr for OldFilesOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(OldFilesOrder::Normal),
            "inverted" => Ok(OldFilesOrder::Inverted),
            other => Err(format!(
                "unknown order '{}' (expected normal or inverted)",
                other
            )),
        }
    }
}

impl fmt::Display for OldFilesSortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OldFilesSortBy::Age => "age",
            OldFilesSortBy::Size => "size",
        })
    }
}

impl fmt::Display for OldFilesOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OldFilesOrder::Normal => "normal",
            OldFilesOrder::Inverted => "inverted",
        })
    }
}

/// Files not modified within the last `max_age_days` days of `now`.
///
/// `max_age_days == 0` finds nothing; `limit == 0` returns every match.
/// Equal keys fall back to path order.
pub fn find_old_files(
    records: &[FileRecord],
    query: &OldFileSettings,
    now: DateTime<Utc>,
) -> Vec<FileSummary> {
    if query.max_age_days == 0 {
        return Vec::new();
    }
    let cutoff = now - Duration::days(i64::from(query.max_age_days));

    let mut old: Vec<FileSummary> = records
        .iter()
        .filter(|r| r.modified_at <= cutoff)
        .map(FileRecord::summary)
        .collect();

    old.sort_by(|a, b| {
        let primary = match query.sort_by {
            OldFilesSortBy::Age => a.modified_at.cmp(&b.modified_at),
            OldFilesSortBy::Size => a.size_bytes.cmp(&b.size_bytes),
        };
        let primary = match query.order {
            OldFilesOrder::Normal => primary,
            OldFilesOrder::Inverted => primary.reverse(),
        };
        primary.then_with(|| a.path.cmp(&b.path))
    });

    if query.limit > 0 {
        old.truncate(query.limit);
    }
    old
}
