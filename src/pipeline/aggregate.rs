//! Per-run accumulation of extracted facts.
//!
//! An [`Aggregator`] lives for exactly one crawl. It filters detail records
//! against the ledger snapshot taken when the run started and collects item
//! summaries plus the tag and category inverted indexes for everything it
//! accepts.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::ItemSummary;
use crate::services::extract;

/// Everything one run accepted, ready to be written out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    /// Summaries in acceptance order
    pub items: Vec<ItemSummary>,
    /// Normalized tag -> identifiers, first-seen first
    pub tags: BTreeMap<String, Vec<String>>,
    /// Category name -> identifiers, first-seen first
    pub categories: BTreeMap<String, Vec<String>>,
    /// Identifiers to append to the ledger
    pub accepted: Vec<String>,
    /// Records dropped because the ledger already had them
    pub skipped: usize,
}

/// Accumulates accepted records for a single run.
#[derive(Debug, Default)]
pub struct Aggregator {
    history: HashSet<String>,
    aggregate: Aggregate,
}

impl Aggregator {
    /// Start a run against a ledger snapshot.
    ///
    /// A missing ledger and an empty one both accept every record.
    pub fn new(snapshot: Option<HashSet<String>>) -> Self {
        Self {
            history: snapshot.unwrap_or_default(),
            aggregate: Aggregate::default(),
        }
    }

    /// Offer one raw detail record.
    ///
    /// Returns `Ok(false)` when the ledger already holds the identifier; the
    /// record then contributes nothing. The snapshot is never updated during
    /// the run, so two records with the same identifier in one batch are both
    /// accepted.
    pub fn accept(&mut self, raw: &Value) -> Result<bool> {
        let identifier = raw
            .get("identifier")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::malformed("<unknown>", "missing field `identifier`"))?;

        if self.history.contains(identifier) {
            log::debug!("Skipping {identifier}: already in ledger");
            self.aggregate.skipped += 1;
            return Ok(false);
        }

        let record = extract::parse_detail(raw)?;
        let id = &record.identifier;

        for tag in extract::tags_of(&record) {
            self.aggregate.tags.entry(tag).or_default().push(id.clone());
        }
        for category in extract::categories_of(&record) {
            self.aggregate
                .categories
                .entry(category)
                .or_default()
                .push(id.clone());
        }
        self.aggregate.items.push(ItemSummary::from(&record));
        self.aggregate.accepted.push(record.identifier);

        Ok(true)
    }

    /// Offer a batch of records in order. Stops at the first malformed one.
    pub fn accept_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a Value>,
    ) -> Result<usize> {
        let mut accepted = 0;
        for raw in records {
            if self.accept(raw)? {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    /// Finish the run and hand over what was collected.
    pub fn finish(self) -> Aggregate {
        self.aggregate
    }
}
