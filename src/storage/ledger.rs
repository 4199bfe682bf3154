//! Ledger of item identifiers that have already been processed.
//!
//! Stored as a plain JSON array of strings. Used as a membership filter at
//! the start of a run and appended to once at the end of it.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::storage::{IndexBatch, IndexStore, WriteMetadata, json_kind};

/// View of the ledger index inside an [`IndexStore`].
pub struct Ledger<'a, T: ?Sized> {
    store: &'a T,
    key: String,
}

impl<'a, T: IndexStore + ?Sized> Ledger<'a, T> {
    pub fn new(store: &'a T, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Identifiers processed by earlier runs.
    ///
    /// `None` when the ledger file is missing or empty.
    pub async fn snapshot(&self) -> Result<Option<HashSet<String>>> {
        let Some(document) = self.store.load(&self.key).await? else {
            return Ok(None);
        };

        let entries = match document {
            Value::Array(entries) => entries,
            other => {
                return Err(AppError::corrupt_index(
                    &self.key,
                    "array",
                    json_kind(&other),
                ));
            }
        };

        entries
            .into_iter()
            .map(|entry| match entry {
                Value::String(id) => Ok(id),
                other => Err(AppError::corrupt_index(
                    &self.key,
                    "array of strings",
                    json_kind(&other),
                )),
            })
            .collect::<Result<HashSet<_>>>()
            .map(Some)
    }

    /// Append identifiers after the ones already recorded.
    ///
    /// Repeats inside `identifiers` are written once. Identifiers that are
    /// already in the file are not checked for, so appending the same batch
    /// in two calls records it twice.
    pub async fn append(&self, identifiers: &[String]) -> Result<WriteMetadata> {
        let mut seen = HashSet::new();
        let batch: Vec<&String> = identifiers
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .collect();

        let meta = self
            .store
            .merge_append(&self.key, &IndexBatch::sequence(&batch)?)
            .await?;
        log::info!(
            "Ledger {}: {} appended, {} recorded",
            self.key,
            meta.written,
            meta.total
        );
        Ok(meta)
    }
}
