// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key/value storage client for durable selection records.
//!
//! Two backends:
//! - Memory (tests, `COVERAGE_STORAGE_BACKEND=memory`)
//! - Directory (one JSON document per key, written atomically)
//!
//! Values are opaque strings here; record layout and versioning belong to
//! the selection store.

use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CoverageError;

const FILE_EXTENSION: &str = "json";

#[derive(Clone)]
enum Backend {
    Memory(Arc<DashMap<String, String>>),
    Directory(Arc<PathBuf>),
}

/// Durable storage client. Cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct StorageDb {
    backend: Backend,
}

impl std::fmt::Debug for StorageDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.backend {
            Backend::Memory(map) => f
                .debug_struct("StorageDb")
                .field("backend", &"memory")
                .field("entries", &map.len())
                .finish(),
            Backend::Directory(dir) => f
                .debug_struct("StorageDb")
                .field("backend", &"directory")
                .field("path", dir)
                .finish(),
        }
    }
}

impl StorageDb {
    /// Open (creating if needed) a directory-backed store.
    pub async fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CoverageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            CoverageError::Storage(format!(
                "Failed to create storage directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        tracing::info!(path = %dir.display(), "Opened directory storage");

        Ok(Self {
            backend: Backend::Directory(Arc::new(dir)),
        })
    }

    /// Create an in-memory store. Contents are lost when the last clone drops.
    pub fn new_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CoverageError> {
        match &self.backend {
            Backend::Memory(map) => Ok(map.get(key).map(|v| v.value().clone())),
            Backend::Directory(dir) => {
                match tokio::fs::read_to_string(file_for(dir, key)).await {
                    Ok(value) => Ok(Some(value)),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(storage_error("read", key, e)),
                }
            }
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Directory writes go to a temporary file first and are renamed into
    /// place, so a reader never sees a half-written document.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), CoverageError> {
        match &self.backend {
            Backend::Memory(map) => {
                map.insert(key.to_string(), value.to_string());
                Ok(())
            }
            Backend::Directory(dir) => {
                let path = file_for(dir, key);
                let tmp = path.with_extension("tmp");
                tokio::fs::write(&tmp, value)
                    .await
                    .map_err(|e| storage_error("write", key, e))?;
                tokio::fs::rename(&tmp, &path)
                    .await
                    .map_err(|e| storage_error("rename", key, e))
            }
        }
    }

    /// Remove `key`. Removing an absent key is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), CoverageError> {
        match &self.backend {
            Backend::Memory(map) => {
                map.remove(key);
                Ok(())
            }
            Backend::Directory(dir) => match tokio::fs::remove_file(file_for(dir, key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(storage_error("remove", key, e)),
            },
        }
    }

    /// Every stored key, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, CoverageError> {
        let mut keys: Vec<String> = match &self.backend {
            Backend::Memory(map) => map.iter().map(|e| e.key().clone()).collect(),
            Backend::Directory(dir) => {
                let mut entries = tokio::fs::read_dir(dir.as_path()).await.map_err(|e| {
                    CoverageError::Storage(format!("Failed to list {}: {}", dir.display(), e))
                })?;
                let mut keys = Vec::new();
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| CoverageError::Storage(e.to_string()))?
                {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                        continue;
                    }
                    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    match urlencoding::decode(stem) {
                        Ok(key) => keys.push(key.into_owned()),
                        Err(e) => {
                            tracing::warn!(file = %path.display(), error = %e, "Skipping undecodable storage file")
                        }
                    }
                }
                keys
            }
        };
        keys.sort();
        Ok(keys)
    }
}

/// Keys may contain `:` and other characters that are not portable in
/// file names, so they are percent-encoded.
fn file_for(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.{}", urlencoding::encode(key), FILE_EXTENSION))
}

fn storage_error(op: &str, key: &str, e: std::io::Error) -> CoverageError {
    CoverageError::Storage(format!("Failed to {} {}: {}", op, key, e))
}
