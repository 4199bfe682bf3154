// src/pipeline/crawl.rs

//! Crawl orchestration.
//!
//! One invocation walks a fixed sequence of stages:
//!
//! ```text
//! Idle -> ListingPages -> FetchingDetails -> Aggregating
//!      -> PersistingLedger -> MergingIndexes -> Done
//! ```
//!
//! Any error moves the run to `Failed`. There is no resume: a failed run is
//! started again from its first page, and the ledger keeps already-accepted
//! items from being processed twice.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Config, PageRange, PagesConfig, PathsConfig, Section};
use crate::pipeline::Aggregator;
use crate::services::{ContentSource, FetchMode, Fetcher, extract};
use crate::storage::{IndexBatch, IndexStore, Ledger};

/// Stage of a crawl invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    ListingPages,
    FetchingDetails,
    Aggregating,
    PersistingLedger,
    MergingIndexes,
    Done,
    Failed,
}

impl CrawlState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CrawlState::Done | CrawlState::Failed)
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlState::Idle => "idle",
            CrawlState::ListingPages => "listing pages",
            CrawlState::FetchingDetails => "fetching details",
            CrawlState::Aggregating => "aggregating",
            CrawlState::PersistingLedger => "persisting ledger",
            CrawlState::MergingIndexes => "merging indexes",
            CrawlState::Done => "done",
            CrawlState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What to crawl, as requested by the caller. Bounds are checked by the
/// pipeline before anything is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlRequest {
    pub section: Section,
    pub start_page: u32,
    pub end_page: u32,
    pub per_page: u32,
    pub mode: FetchMode,
}

impl CrawlRequest {
    pub fn range(&self, bounds: &PagesConfig) -> Result<PageRange> {
        PageRange::new(self.start_page, self.end_page, self.per_page, bounds)
    }
}

/// Summary of a finished crawl.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub page_count: usize,
    /// Identifiers found across all listed pages
    pub listed: usize,
    /// Records newly added to the indexes
    pub accepted: usize,
    /// Records already present in the ledger
    pub skipped: usize,
    pub items_total: usize,
    pub tags_total: usize,
    pub categories_total: usize,
}

/// Runs one crawl from page listing to index merge.
pub struct Pipeline<S, T> {
    fetcher: Fetcher<S>,
    store: T,
    pages: PagesConfig,
    paths: PathsConfig,
    state: CrawlState,
}

impl<S: ContentSource, T: IndexStore> Pipeline<S, T> {
    pub fn new(source: S, store: T, config: &Config) -> Self {
        Self::with_fetcher(Fetcher::new(source, &config.crawler), store, config)
    }

    pub fn with_fetcher(fetcher: Fetcher<S>, store: T, config: &Config) -> Self {
        Self {
            fetcher,
            store,
            pages: config.pages.clone(),
            paths: config.paths.clone(),
            state: CrawlState::Idle,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    /// Run the crawl.
    ///
    /// An out-of-bounds request is rejected while the pipeline is still
    /// `Idle`, before any request is sent. A pipeline runs once; calling
    /// `run` again after it reached `Done` or `Failed` is an error.
    pub async fn run(&mut self, request: &CrawlRequest) -> Result<CrawlReport> {
        if self.state != CrawlState::Idle {
            return Err(AppError::validation(format!(
                "pipeline already {}; create a new one for another run",
                self.state
            )));
        }

        let range = request.range(&self.pages).inspect_err(|e| {
            log::error!("Rejected crawl request: {e}");
        })?;

        match self.execute(request, &range).await {
            Ok(report) => {
                self.transition(CrawlState::Done);
                Ok(report)
            }
            Err(e) => {
                log::error!("Crawl failed while {}: {}", self.state, e);
                self.transition(CrawlState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&mut self, request: &CrawlRequest, range: &PageRange) -> Result<CrawlReport> {
        let start_time = Utc::now();
        let ledger = Ledger::new(&self.store, self.paths.ledger_file.clone());
        let snapshot = ledger.snapshot().await?;
        match &snapshot {
            Some(seen) => log::info!("Ledger holds {} processed identifiers", seen.len()),
            None => log::info!("No ledger yet; every item will be accepted"),
        }

        self.transition(CrawlState::ListingPages);
        let pages = self.fetcher.collect_pages(request.section, range).await?;
        let identifiers = extract::identifiers_from_list_batch(&pages)?;
        log::info!(
            "Listed {} items across {} pages of {}",
            identifiers.len(),
            pages.len(),
            request.section
        );

        self.transition(CrawlState::FetchingDetails);
        let records = self
            .fetcher
            .collect_details(&identifiers, request.mode)
            .await?;

        self.transition(CrawlState::Aggregating);
        let mut aggregator = Aggregator::new(snapshot);
        aggregator.accept_all(&records)?;
        let aggregate = aggregator.finish();
        log::info!(
            "Accepted {} new items, skipped {} already processed",
            aggregate.accepted.len(),
            aggregate.skipped
        );

        let items_batch = IndexBatch::sequence(&aggregate.items)?;
        let tags_batch = IndexBatch::mapping(&aggregate.tags);
        let categories_batch = IndexBatch::mapping(&aggregate.categories);
        self.check_indexes(&[
            (&self.paths.items_file, &items_batch),
            (&self.paths.tags_file, &tags_batch),
            (&self.paths.categories_file, &categories_batch),
        ])
        .await?;

        self.transition(CrawlState::PersistingLedger);
        let ledger = Ledger::new(&self.store, self.paths.ledger_file.clone());
        ledger.append(&aggregate.accepted).await?;

        self.transition(CrawlState::MergingIndexes);
        let items = self.merge(&self.paths.items_file, &items_batch).await?;
        let tags = self.merge(&self.paths.tags_file, &tags_batch).await?;
        let categories = self
            .merge(&self.paths.categories_file, &categories_batch)
            .await?;

        Ok(CrawlReport {
            start_time,
            end_time: Utc::now(),
            page_count: pages.len(),
            listed: identifiers.len(),
            accepted: aggregate.accepted.len(),
            skipped: aggregate.skipped,
            items_total: items,
            tags_total: tags,
            categories_total: categories,
        })
    }

    /// Fail on a mismatched index before the ledger records anything.
    ///
    /// Empty batches are not checked since they never touch their file.
    async fn check_indexes(&self, indexes: &[(&String, &IndexBatch)]) -> Result<()> {
        for (key, batch) in indexes {
            if batch.is_empty() {
                continue;
            }
            if let Some(existing) = self.store.load(key).await? {
                batch.check_against(key, &existing)?;
            }
        }
        Ok(())
    }

    /// Merge one batch and return the index size afterwards.
    async fn merge(&self, key: &str, batch: &IndexBatch) -> Result<usize> {
        let meta = self.store.merge_append(key, batch).await?;
        log::info!("{key}: +{} entries, {} total", meta.written, meta.total);
        Ok(meta.total)
    }

    fn transition(&mut self, next: CrawlState) {
        log::debug!("Crawl state: {} -> {}", self.state, next);
        self.state = next;
    }
}
