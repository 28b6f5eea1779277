//! The authoritative table of duplicate groups.
//!
//! Mutating operations take `&mut self` and `search` takes `&self`, so the
//! single-writer rule is enforced by the borrow checker. Embedders that
//! serve concurrent readers wrap the store in a `RwLock`.

mod models;
mod persist;
mod search;

pub use models::{DuplicateGroup, FileSummary, GroupEntry};
pub use persist::GroupMap;
pub use search::{SearchQuery, SortBy, SortOrder};

use crate::config::AppConfig;
use crate::corpus::CorpusSource;
use crate::engine::{DedupeEngine, RunStats};
use crate::error::Result;
use crate::progress::ProgressReporter;
use ahash::AHashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome<'a> {
    /// The mapping now held by the store.
    Loaded { groups: &'a GroupMap },
    /// Nothing has been persisted yet.
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The path is not a member of any group.
    NotFound,
    Shrunk { group_id: String, remaining: usize },
    /// The group fell below the minimum size and was dropped.
    GroupDeleted { group_id: String },
}

pub struct DuplicateGroupStore {
    engine: DedupeEngine,
    dupe_file: PathBuf,
    groups: GroupMap,
    last_run: Option<RunStats>,
}

impl DuplicateGroupStore {
    pub fn new(engine: DedupeEngine, dupe_file: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            dupe_file: dupe_file.into(),
            groups: GroupMap::new(),
            last_run: None,
        }
    }

    /// Build the engine from `config` and point the store at its dupe file.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let engine = DedupeEngine::new(config.dedupe.clone())?;
        Ok(Self::new(engine, &config.dupe_file))
    }

    /// Recompute all groups from the corpus and replace the in-memory table.
    /// Nothing is written to disk.
    pub fn compute(
        &mut self,
        corpus: &dyn CorpusSource,
        reporter: &dyn ProgressReporter,
    ) -> Result<&GroupMap> {
        let snapshot = corpus.snapshot()?;
        let run = self.engine.run(snapshot, reporter)?;
        self.groups = run.groups;
        self.last_run = Some(run.stats);
        Ok(&self.groups)
    }

    /// Replace the in-memory table with the persisted document. On error
    /// the current table is kept.
    ///
    /// A document edited by hand may break the table's rules; it is repaired
    /// on the way in (see `repair_loaded`).
    pub fn load(&mut self) -> Result<LoadOutcome<'_>> {
        match persist::read_document(&self.dupe_file)? {
            Some(groups) => {
                let min_len = self.engine.settings().min_category_length;
                self.groups = repair_loaded(groups, min_len);
                info!(
                    "Loaded {} duplicate groups from {}",
                    self.groups.len(),
                    self.dupe_file.display()
                );
                Ok(LoadOutcome::Loaded {
                    groups: &self.groups,
                })
            }
            None => {
                self.groups.clear();
                info!("No duplicate data at {}", self.dupe_file.display());
                Ok(LoadOutcome::NoData)
            }
        }
    }

    /// Atomically persist the in-memory table.
    pub fn save(&self) -> Result<()> {
        persist::write_document(&self.dupe_file, &self.groups)?;
        info!(
            "Saved {} duplicate groups to {}",
            self.groups.len(),
            self.dupe_file.display()
        );
        Ok(())
    }

    /// Filter and sort the in-memory groups. Never touches disk.
    pub fn search(&self, query: &SearchQuery) -> Vec<GroupEntry> {
        search::run(&self.groups, query)
    }

    /// Drop `path` from whichever group holds it.
    pub fn remove_file(&mut self, path: &str) -> RemoveOutcome {
        let group_id = match self
            .groups
            .iter()
            .find(|(_, group)| group.contains(path))
            .map(|(id, _)| id.clone())
        {
            Some(id) => id,
            None => {
                debug!("'{}' is not part of any duplicate group", path);
                return RemoveOutcome::NotFound;
            }
        };

        let min_len = self.engine.settings().min_category_length;
        let remaining = match self.groups.get_mut(&group_id) {
            Some(group) => {
                group.files.retain(|f| f.path != path);
                group.file_count = group.files.len();
                group.file_count
            }
            None => return RemoveOutcome::NotFound,
        };

        if remaining == 0 || remaining < min_len {
            self.groups.remove(&group_id);
            debug!("Group {} dropped after removing '{}'", group_id, path);
            RemoveOutcome::GroupDeleted { group_id }
        } else {
            debug!("Group {} shrunk to {} files", group_id, remaining);
            RemoveOutcome::Shrunk {
                group_id,
                remaining,
            }
        }
    }

    /// Returns `false` when no such group exists.
    pub fn remove_group(&mut self, group_id: &str) -> bool {
        self.groups.remove(group_id).is_some()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn groups(&self) -> &GroupMap {
        &self.groups
    }

    pub fn get(&self, group_id: &str) -> Option<&DuplicateGroup> {
        self.groups.get(group_id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn engine(&self) -> &DedupeEngine {
        &self.engine
    }

    /// Statistics of the most recent `compute()`, if any.
    pub fn last_run(&self) -> Option<&RunStats> {
        self.last_run.as_ref()
    }
}

/// Enforce the table's rules on a loaded document, walking groups in id order:
/// - a path already claimed by an earlier group is dropped from later ones
/// - `file_count` is recomputed from `files`
/// - groups left with fewer than `min_len` members are dropped
fn repair_loaded(groups: GroupMap, min_len: usize) -> GroupMap {
    let mut claimed: AHashSet<String> = AHashSet::new();
    let mut repaired = GroupMap::new();

    for (id, mut group) in groups {
        let listed = group.files.len();
        let mut in_group: AHashSet<String> = AHashSet::new();
        group.files.retain(|f| {
            if claimed.contains(&f.path) || !in_group.insert(f.path.clone()) {
                warn!("Path '{}' repeated in group {}, dropping it", f.path, id);
                false
            } else {
                true
            }
        });

        if group.file_count != listed {
            warn!(
                "Group {} records file_count {} but lists {} files, repairing",
                id, group.file_count, listed
            );
        }
        group.file_count = group.files.len();

        if group.file_count < min_len {
            warn!(
                "Group {} has {} files, fewer than {}, dropping it",
                id, group.file_count, min_len
            );
            continue;
        }
        claimed.extend(in_group);
        repaired.insert(id, group);
    }
    repaired
}
