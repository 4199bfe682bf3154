//! Records exchanged with the content API and persisted in the indexes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a section listing.
///
/// Only the item array matters; every other field of the payload is ignored.
/// A payload without `data` does not decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPage {
    pub data: Vec<ListEntry>,
}

/// A listed item. Carries just enough to request its detail record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEntry {
    pub identifier: String,
}

/// Detail record as returned by `GET /detail/{identifier}`.
///
/// Summary fields are carried through as whatever JSON the API sent; only
/// their presence is required. A field that is present but `null` decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    pub id: Value,
    pub identifier: String,
    pub title: Value,
    pub thumbnail: Value,
    pub view_count: Value,
    pub like_count: Value,
    pub comment_count: Value,
    pub permalink: Value,
    pub published_at: Value,
    pub tags: Vec<String>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

/// Fixed-field projection of a detail record, one per accepted item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: Value,
    pub title: Value,
    pub thumbnail: Value,
    pub view_count: Value,
    pub like_count: Value,
    pub comment_count: Value,
    pub permalink: Value,
    pub published_at: Value,
    pub identifier: String,
}

impl From<&DetailRecord> for ItemSummary {
    fn from(record: &DetailRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            thumbnail: record.thumbnail.clone(),
            view_count: record.view_count.clone(),
            like_count: record.like_count.clone(),
            comment_count: record.comment_count.clone(),
            permalink: record.permalink.clone(),
            published_at: record.published_at.clone(),
            identifier: record.identifier.clone(),
        }
    }
}
