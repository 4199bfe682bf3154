// src/services/extract.rs

//! Turns raw API payloads into identifiers, summaries and index keys.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{DetailRecord, ItemSummary, ListPage};

/// Leading marker stripped from hashtags.
const TAG_MARKER: char = '#';

/// Flatten listing pages into item identifiers, in encounter order.
///
/// Identifiers repeated across pages are kept; filtering against history is
/// the aggregator's concern.
pub fn identifiers_from_list_batch(pages: &[Value]) -> Result<Vec<String>> {
    let mut identifiers = Vec::new();
    for (n, raw) in pages.iter().enumerate() {
        let page = ListPage::deserialize(raw)
            .map_err(|e| AppError::malformed(format!("list page #{}", n + 1), e))?;
        identifiers.extend(page.data.into_iter().map(|entry| entry.identifier));
    }
    Ok(identifiers)
}

/// Decode a raw detail record, failing if a required field is absent.
///
/// Summary fields are not type-checked; `identifier`, `tags` and category
/// names must be strings since they become index keys.
pub fn parse_detail(raw: &Value) -> Result<DetailRecord> {
    DetailRecord::deserialize(raw).map_err(|e| {
        let identifier = raw
            .get("identifier")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>");
        AppError::malformed(identifier, e)
    })
}

/// Project a raw detail record onto its summary fields.
pub fn project(raw: &Value) -> Result<ItemSummary> {
    parse_detail(raw).map(|record| ItemSummary::from(&record))
}

/// Normalize a tag: lower-case with leading `#` markers removed.
pub fn normalize_tag(tag: &str) -> String {
    tag.to_lowercase().trim_start_matches(TAG_MARKER).to_string()
}

/// Distinct normalized tags of a record, in first-seen order.
///
/// Tags that normalize to an empty string are dropped.
pub fn tags_of(record: &DetailRecord) -> Vec<String> {
    let tags = record.tags.iter().map(|tag| normalize_tag(tag));
    distinct(tags.filter(|tag| !tag.is_empty()))
}

/// Distinct category names of a record, in first-seen order.
pub fn categories_of(record: &DetailRecord) -> Vec<String> {
    distinct(record.categories.iter().map(|c| c.name.clone()))
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(v.clone())).collect()
}
