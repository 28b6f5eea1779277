use crate::error::{Error, Result};
use crate::stale::{OldFilesOrder, OldFilesSortBy};
use crate::text::Normalization;
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON index document produced by the indexer.
    pub index_file: String,
    /// Where duplicate groups are persisted.
    pub dupe_file: String,
    pub dedupe: DedupeSettings,
    pub old_files: OldFileSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            index_file: "data/file_index.json".to_string(),
            dupe_file: "data/dupes.json".to_string(),
            dedupe: DedupeSettings::default(),
            old_files: OldFileSettings::default(),
        }
    }
}

/// Knobs of the near-duplicate engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DedupeSettings {
    pub length_range_step: usize,
    pub min_category_length: usize,
    /// Shingle length K, in characters.
    pub shingle_length: usize,
    /// Stride S between shingle starts.
    pub shingle_step: usize,
    /// Signature size M (number of hash functions).
    pub signature_size: usize,
    pub similarity_threshold: f64,
    /// 0 picks a size from the available cores.
    pub worker_count: usize,
    pub signature_seed: u64,
    pub normalization: Normalization,
}

impl Default for DedupeSettings {
    fn default() -> Self {
        Self {
            length_range_step: 10,
            min_category_length: 2,
            shingle_length: 5,
            shingle_step: 1,
            signature_size: 100,
            similarity_threshold: 0.8,
            worker_count: 0,
            signature_seed: 42,
            normalization: Normalization::default(),
        }
    }
}

impl DedupeSettings {
    pub fn validate(&self) -> Result<()> {
        if self.length_range_step < 1 {
            return Err(invalid("length_range_step must be >= 1"));
        }
        if self.min_category_length < 2 {
            return Err(invalid("min_category_length must be >= 2"));
        }
        if self.shingle_length < 1 {
            return Err(invalid("shingle_length must be >= 1"));
        }
        if self.shingle_step < 1 {
            return Err(invalid("shingle_step must be >= 1"));
        }
        if self.signature_size < 1 {
            return Err(invalid("signature_size must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::InvalidSetting(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OldFileSettings {
    pub max_age_days: u32,
    /// 0 means unlimited.
    pub limit: usize,
    pub sort_by: OldFilesSortBy,
    pub order: OldFilesOrder,
}

impl Default for OldFileSettings {
    fn default() -> Self {
        Self {
            max_age_days: 1000,
            limit: 0,
            sort_by: OldFilesSortBy::Age,
            order: OldFilesOrder::Normal,
        }
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidSetting(msg.to_string())
}

/// Layer defaults, an optional config file and `NEAR_DUPER__*` environment
/// variables, then validate the dedupe settings.
///
/// Without an explicit path, `Config.toml` (or any format `config` knows)
/// in the working directory is used when present.
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig> {
    let file_source = match path {
        Some(p) => ConfigFile::from(p).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };

    let builder = Config::builder()
        .add_source(file_source)
        .add_source(
            Environment::with_prefix("NEAR_DUPER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config = builder.try_deserialize::<AppConfig>()?;
    app_config.dedupe.validate()?;
    Ok(app_config)
}
