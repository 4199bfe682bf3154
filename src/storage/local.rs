//! Local filesystem storage implementation.
//!
//! Each key is a JSON file under the root directory. Writes go to a
//! temporary sibling first and are renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{IndexBatch, IndexStore, WriteMetadata, entry_count};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write a JSON document, pretty-printed.
    async fn write_json(&self, key: &str, value: &Value) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl IndexStore for LocalStorage {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        match self.read_bytes(key).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            _ => Ok(None),
        }
    }

    async fn overwrite(&self, key: &str, batch: &IndexBatch) -> Result<WriteMetadata> {
        let document = batch.to_value();
        self.write_json(key, &document).await?;

        let total = entry_count(&document);
        log::debug!("Overwrote {key} with {total} entries");
        Ok(WriteMetadata {
            written: total,
            total,
            changed: true,
        })
    }

    async fn merge_append(&self, key: &str, batch: &IndexBatch) -> Result<WriteMetadata> {
        let existing = self.load(key).await?;

        if batch.is_empty() {
            log::debug!("Nothing to merge into {key}");
            return Ok(WriteMetadata {
                written: 0,
                total: existing.as_ref().map_or(0, entry_count),
                changed: false,
            });
        }

        let Some(mut document) = existing else {
            return self.overwrite(key, batch).await;
        };

        batch.merge_into(key, &mut document)?;
        self.write_json(key, &document).await?;

        let written = entry_count(&batch.to_value());
        let total = entry_count(&document);
        log::debug!("Merged {written} entries into {key} ({total} total)");
        Ok(WriteMetadata {
            written,
            total,
            changed: true,
        })
    }
}
