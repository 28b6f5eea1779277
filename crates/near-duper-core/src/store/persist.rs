use super::models::DuplicateGroup;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub type GroupMap = BTreeMap<String, DuplicateGroup>;

/// Read the persisted document. `Ok(None)` when no document exists yet.
pub fn read_document(path: &Path) -> Result<Option<GroupMap>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(Error::Persist {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|source| Error::CorruptDocument {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace the document atomically: write a sibling temp file, fsync it,
/// then rename it over the target.
pub fn write_document(path: &Path, groups: &GroupMap) -> Result<()> {
    let payload = serde_json::to_vec_pretty(groups).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;

    let tmp_path = temp_path_for(path);
    let result = (|| -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::File::create(&tmp_path)?;
        f.write_all(&payload)?;
        f.flush()?;
        f.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    result.map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        Error::Persist {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "dupes".into());
    name.push(".tmp");
    path.with_file_name(name)
}
