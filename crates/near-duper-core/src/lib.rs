pub mod cluster;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod minhash;
pub mod pool;
pub mod progress;
pub mod stale;
pub mod store;
pub mod text;

pub use config::{AppConfig, DedupeSettings, OldFileSettings};
pub use corpus::{CorpusSnapshot, CorpusSource, FileRecord, IndexFile, SkipReason, SkippedFile};
pub use engine::{DedupeEngine, DedupeRun, RunStats};
pub use error::{Error, Result};
pub use progress::{ProgressReporter, SilentReporter};
pub use store::{
    DuplicateGroup, DuplicateGroupStore, FileSummary, GroupEntry, LoadOutcome, RemoveOutcome,
    SearchQuery, SortBy, SortOrder,
};
