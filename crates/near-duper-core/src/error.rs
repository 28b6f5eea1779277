use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Failed to persist '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt duplicate document '{}': {source}", path.display())]
    CorruptDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed index document '{}': {source}", path.display())]
    MalformedIndex {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Load/save failures. The in-memory store is left untouched when one of
    /// these is returned.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persist { .. } | Error::CorruptDocument { .. })
    }

    /// Errors rejected before any run starts.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidSetting(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
