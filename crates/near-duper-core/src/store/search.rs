use super::models::{DuplicateGroup, GroupEntry};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Similarity,
    /// Start of the length range.
    Length,
    FileCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "similarity" => Ok(SortBy::Similarity),
            "length" => Ok(SortBy::Length),
            "file_count" | "file-count" => Ok(SortBy::FileCount),
            other => Err(format!(
                "unknown sort key '{}' (expected similarity, length or file_count)",
                other
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}' (expected asc or desc)", other)),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortBy::Similarity => "similarity",
            SortBy::Length => "length",
            SortBy::FileCount => "file_count",
        })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

/// Filter and ordering applied to the loaded groups.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Whitespace-separated terms; each must occur in some member's name or path.
    pub query: String,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    /// Exact `length_range` to keep; empty keeps all.
    pub length_range_filter: String,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    pub fn length_range(mut self, filter: impl Into<String>) -> Self {
        self.length_range_filter = filter.into();
        self
    }
}

pub(super) fn run<'a, I>(groups: I, search: &SearchQuery) -> Vec<GroupEntry>
where
    I: IntoIterator<Item = (&'a String, &'a DuplicateGroup)>,
{
    let terms: Vec<String> = search
        .query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    let length_filter = search.length_range_filter.trim();

    let mut hits: Vec<GroupEntry> = groups
        .into_iter()
        .filter(|(_, group)| length_filter.is_empty() || group.length_range == length_filter)
        .filter(|(_, group)| matches_terms(group, &terms))
        .map(|(id, group)| GroupEntry {
            group_id: id.clone(),
            group: group.clone(),
        })
        .collect();

    hits.sort_by(|a, b| {
        let primary = match search.sort_by {
            SortBy::Similarity => a
                .group
                .avg_similarity
                .partial_cmp(&b.group.avg_similarity)
                .unwrap_or(Ordering::Equal),
            SortBy::Length => a.group.length_start().cmp(&b.group.length_start()),
            SortBy::FileCount => a.group.file_count.cmp(&b.group.file_count),
        };
        let primary = match search.sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.group_id.cmp(&b.group_id))
    });

    hits
}

fn matches_terms(group: &DuplicateGroup, terms: &[String]) -> bool {
    terms.iter().all(|term| {
        group.files.iter().any(|f| {
            f.name.to_lowercase().contains(term.as_str())
                || f.path.to_lowercase().contains(term.as_str())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_options() {
        assert_eq!("similarity".parse::<SortBy>().unwrap(), SortBy::Similarity);
        assert_eq!("LENGTH".parse::<SortBy>().unwrap(), SortBy::Length);
        assert_eq!("file_count".parse::<SortBy>().unwrap(), SortBy::FileCount);
        assert!("size".parse::<SortBy>().is_err());

        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!(" Desc ".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("inverted".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for key in [SortBy::Similarity, SortBy::Length, SortBy::FileCount] {
            assert_eq!(key.to_string().parse::<SortBy>().unwrap(), key);
        }
    }
}
