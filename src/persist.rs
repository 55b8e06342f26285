//! Small JSON state files (session token, freshness index).
//!
//! Writes go through a temp file in the target directory and an atomic
//! rename, so a crash mid-write never leaves a truncated file behind.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("blocking write task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Read a JSON file; a missing file is `Ok(None)`
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Atomically replace `path` with the JSON encoding of `value`
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(io_err)?;

        let mut temp_file = NamedTempFile::new_in(parent).map_err(io_err)?;
        temp_file.write_all(&bytes).map_err(io_err)?;
        temp_file.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    })
    .await?
}
