//! Storage abstractions for index persistence.
//!
//! Every index is one pretty-printed JSON document, read whole and rewritten
//! whole. Two shapes exist:
//!
//! ```text
//! storage/
//! ├── ledger.json       # Sequence: ["id1", "id2", ...]
//! ├── items.json        # Sequence: [{ItemSummary}, ...]
//! ├── tags.json         # Mapping:  {"tag": ["id1", ...], ...}
//! └── categories.json   # Mapping:  {"category": ["id1", ...], ...}
//! ```

pub mod ledger;
pub mod local;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result};

// Re-export for convenience
pub use ledger::Ledger;
pub use local::LocalStorage;

/// A batch of new index content, tagged with the shape the caller intends.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexBatch {
    /// Records appended to a list-shaped index.
    Sequence(Vec<Value>),
    /// Key -> identifiers, appended per key to a mapping-shaped index.
    Mapping(BTreeMap<String, Vec<Value>>),
}

impl IndexBatch {
    /// Build a sequence batch from serializable records.
    pub fn sequence<T: Serialize>(records: &[T]) -> Result<Self> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Self::Sequence(values))
    }

    /// Build a mapping batch from an inverted index.
    pub fn mapping(index: &BTreeMap<String, Vec<String>>) -> Self {
        let values = index
            .iter()
            .map(|(key, ids)| {
                let ids = ids.iter().cloned().map(Value::String).collect();
                (key.clone(), ids)
            })
            .collect();
        Self::Mapping(values)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Sequence(values) => values.is_empty(),
            Self::Mapping(map) => map.is_empty(),
        }
    }

    /// JSON type name of the top-level document this batch belongs in.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Sequence(_) => "array",
            Self::Mapping(_) => "object",
        }
    }

    /// The batch as a standalone document.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Sequence(values) => Value::Array(values.clone()),
            Self::Mapping(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::Array(v.clone())))
                    .collect(),
            ),
        }
    }

    /// Check that `existing` can take this batch without touching it.
    ///
    /// The top-level shape must match, and for a mapping every key the batch
    /// contributes to must already hold an array if present.
    pub fn check_against(&self, key: &str, existing: &Value) -> Result<()> {
        match (self, existing) {
            (Self::Sequence(_), Value::Array(_)) => Ok(()),
            (Self::Mapping(map), Value::Object(current)) => {
                for name in map.keys() {
                    match current.get(name) {
                        None | Some(Value::Array(_)) => {}
                        Some(other) => {
                            return Err(AppError::corrupt_index(
                                format!("{key}[{name}]"),
                                "array",
                                json_kind(other),
                            ));
                        }
                    }
                }
                Ok(())
            }
            (batch, other) => Err(AppError::corrupt_index(key, batch.shape(), json_kind(other))),
        }
    }

    /// Fold this batch into an existing document of the same shape.
    ///
    /// Existing records and keys are never removed or reordered. A mapping
    /// key already present gets the new identifiers appended after its
    /// current ones; a new key is inserted as-is. `existing` is left as it
    /// was when the shapes do not match.
    pub fn merge_into(&self, key: &str, existing: &mut Value) -> Result<()> {
        self.check_against(key, existing)?;
        match (self, existing) {
            (Self::Sequence(values), Value::Array(current)) => {
                current.extend(values.iter().cloned());
            }
            (Self::Mapping(map), Value::Object(current)) => {
                for (name, ids) in map {
                    match current.get_mut(name) {
                        Some(Value::Array(present)) => present.extend(ids.iter().cloned()),
                        _ => {
                            current.insert(name.clone(), Value::Array(ids.clone()));
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Number of top-level entries in an index document.
pub fn entry_count(value: &Value) -> usize {
    match value {
        Value::Array(values) => values.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

/// JSON type name, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Metadata about an index write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteMetadata {
    /// Entries contributed by the batch
    pub written: usize,
    /// Top-level entries in the index after the write
    pub total: usize,
    /// Whether the file was touched at all
    pub changed: bool,
}

/// Trait for index storage backends.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Load an index document.
    ///
    /// Returns `None` when the index does not exist or holds no content.
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the whole index with the batch.
    async fn overwrite(&self, key: &str, batch: &IndexBatch) -> Result<WriteMetadata>;

    /// Fold the batch into the index by shape.
    ///
    /// Behaves like [`IndexStore::overwrite`] when the index is missing or
    /// empty. An empty batch leaves the index untouched. Fails with
    /// `CorruptIndex` when the stored document has a different shape.
    async fn merge_append(&self, key: &str, batch: &IndexBatch) -> Result<WriteMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(pairs: &[(&str, &[&str])]) -> IndexBatch {
        let map: BTreeMap<String, Vec<String>> = pairs
            .iter()
            .map(|(k, ids)| (k.to_string(), ids.iter().map(|s| s.to_string()).collect()))
            .collect();
        IndexBatch::mapping(&map)
    }

    #[test]
    fn test_merge_mapping_appends_and_inserts() {
        let mut existing = json!({"x": ["a"]});
        mapping(&[("x", &["b"]), ("y", &["c"])])
            .merge_into("tags.json", &mut existing)
            .unwrap();
        assert_eq!(existing, json!({"x": ["a", "b"], "y": ["c"]}));
    }

    #[test]
    fn test_merge_mapping_keeps_untouched_keys() {
        let mut existing = json!({"old": ["a", "b"], "x": ["c"]});
        mapping(&[("x", &["d"])])
            .merge_into("tags.json", &mut existing)
            .unwrap();
        assert_eq!(existing, json!({"old": ["a", "b"], "x": ["c", "d"]}));
    }

    #[test]
    fn test_merge_sequence_appends() {
        let mut existing = json!(["a", "b"]);
        IndexBatch::sequence(&["c", "a"])
            .unwrap()
            .merge_into("ledger.json", &mut existing)
            .unwrap();
        assert_eq!(existing, json!(["a", "b", "c", "a"]));
    }

    #[test]
    fn test_shape_mismatch_is_corrupt() {
        let mut existing = json!(["a"]);
        let err = mapping(&[("x", &["b"])])
            .merge_into("tags.json", &mut existing)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::CorruptIndex {
                expected: "object",
                found: "array",
                ..
            }
        ));

        let mut existing = json!({"x": ["a"]});
        let err = IndexBatch::Sequence(vec![json!("b")])
            .merge_into("items.json", &mut existing)
            .unwrap_err();
        assert!(matches!(err, AppError::CorruptIndex { .. }));
    }

    #[test]
    fn test_mapping_value_must_be_array() {
        let mut existing = json!({"x": "a"});
        let err = mapping(&[("x", &["b"])])
            .merge_into("tags.json", &mut existing)
            .unwrap_err();
        assert!(matches!(err, AppError::CorruptIndex { .. }));
    }

    #[test]
    fn test_check_against_leaves_document_alone() {
        let existing = json!({"x": ["a"], "y": 3});
        let batch = mapping(&[("x", &["b"]), ("y", &["c"])]);

        assert!(batch.check_against("tags.json", &existing).is_err());
        assert!(mapping(&[("x", &["b"])]).check_against("tags.json", &existing).is_ok());

        let mut untouched = existing.clone();
        assert!(batch.merge_into("tags.json", &mut untouched).is_err());
        assert_eq!(untouched, existing);
    }

    #[test]
    fn test_batch_helpers() {
        let batch = mapping(&[("x", &["a"])]);
        assert_eq!(batch.shape(), "object");
        assert!(!batch.is_empty());
        assert_eq!(batch.to_value(), json!({"x": ["a"]}));
        assert_eq!(entry_count(&batch.to_value()), 1);
        assert!(IndexBatch::Sequence(Vec::new()).is_empty());
    }
}
