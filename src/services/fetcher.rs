// src/services/fetcher.rs

//! Page listing and detail collection strategies.
//!
//! Listing is always sequential and paced. Detail records can be collected
//! either through a bounded parallel pool or one at a time with the same
//! pacing as listing.

use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tokio::time::{Instant, sleep_until};

use crate::error::Result;
use crate::models::{CrawlerConfig, PageRange, Section};
use crate::services::ContentSource;

/// How detail records are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Up to `max_concurrent` requests in flight at once.
    #[default]
    Parallel,
    /// One request at a time, paced by the request delay.
    Sequential,
}

/// Enforces a minimum gap between the *starts* of consecutive requests.
#[derive(Debug)]
struct Pacer {
    delay: Duration,
    last_start: Option<Instant>,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_start: None,
        }
    }

    /// Wait until the next request may start, then mark it started.
    async fn ready(&mut self) {
        if let Some(last) = self.last_start {
            sleep_until(last + self.delay).await;
        }
        self.last_start = Some(Instant::now());
    }
}

/// Collects raw list pages and detail records from a [`ContentSource`].
pub struct Fetcher<S> {
    source: S,
    delay: Duration,
    max_concurrent: usize,
}

impl<S: ContentSource> Fetcher<S> {
    /// Create a fetcher using the delay and concurrency bound from `config`.
    pub fn new(source: S, config: &CrawlerConfig) -> Self {
        Self::with_limits(source, config.request_delay(), config.max_concurrent)
    }

    pub fn with_limits(source: S, delay: Duration, max_concurrent: usize) -> Self {
        Self {
            source,
            delay,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch a single list page.
    pub async fn list_page(&self, section: Section, page: u32, per_page: u32) -> Result<Value> {
        self.source.list_page(section, page, per_page).await
    }

    /// Fetch a single detail record.
    pub async fn detail(&self, identifier: &str) -> Result<Value> {
        self.source.detail(identifier).await
    }

    /// List every page of `range` in order, pacing page requests.
    ///
    /// The first failing page aborts the listing.
    pub async fn collect_pages(&self, section: Section, range: &PageRange) -> Result<Vec<Value>> {
        let mut pacer = Pacer::new(self.delay);
        let mut pages = Vec::with_capacity(range.page_count());

        for page in range.pages() {
            pacer.ready().await;
            log::info!("Listing {section} page {page}/{}", range.end());
            pages.push(self.list_page(section, page, range.per_page()).await?);
        }
        Ok(pages)
    }

    /// Collect detail records with the given strategy.
    pub async fn collect_details(
        &self,
        identifiers: &[String],
        mode: FetchMode,
    ) -> Result<Vec<Value>> {
        match mode {
            FetchMode::Parallel => self.collect_parallel(identifiers).await,
            FetchMode::Sequential => self.collect_sequential(identifiers).await,
        }
    }

    /// Fetch all details concurrently, bounded by `max_concurrent`.
    ///
    /// Records come back in input order. On the first failure the remaining
    /// in-flight requests are dropped and the error is returned.
    pub async fn collect_parallel(&self, identifiers: &[String]) -> Result<Vec<Value>> {
        let started = Instant::now();

        let records: Vec<Value> = stream::iter(identifiers)
            .map(|identifier| self.detail(identifier))
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        log::info!(
            "Fetched {} detail records in {:.2?} (parallel, limit {})",
            records.len(),
            started.elapsed(),
            self.max_concurrent
        );
        Ok(records)
    }

    /// Fetch details one at a time, keeping `delay` between request starts.
    pub async fn collect_sequential(&self, identifiers: &[String]) -> Result<Vec<Value>> {
        let started = Instant::now();
        let total = identifiers.len();
        let mut pacer = Pacer::new(self.delay);
        let mut records = Vec::with_capacity(total);

        for (n, identifier) in identifiers.iter().enumerate() {
            pacer.ready().await;
            log::info!("Fetching detail [{}/{}] {}", n + 1, total, identifier);
            records.push(self.detail(identifier).await?);
        }

        log::info!(
            "Fetched {} detail records in {:.2?} (sequential)",
            records.len(),
            started.elapsed()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::AppError;
    use crate::models::PagesConfig;

    /// Records when each request started and how many ran at once.
    #[derive(Default)]
    struct RecordingSource {
        starts: Mutex<Vec<(String, Instant)>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        latency: Duration,
        failing: HashSet<String>,
    }

    impl RecordingSource {
        fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        fn start_times(&self) -> Vec<Instant> {
            self.starts.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }

        async fn enter(&self, key: String) {
            self.starts.lock().unwrap().push((key, Instant::now()));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ContentSource for RecordingSource {
        async fn list_page(&self, section: Section, page: u32, per_page: u32) -> Result<Value> {
            self.enter(format!("{section}:{page}")).await;
            Ok(json!({ "data": [], "page": page, "perPage": per_page }))
        }

        async fn detail(&self, identifier: &str) -> Result<Value> {
            self.enter(identifier.to_string()).await;
            if self.failing.contains(identifier) {
                return Err(AppError::validation(format!("boom {identifier}")));
            }
            Ok(json!({ "identifier": identifier }))
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_spaces_request_starts() {
        let fetcher = Fetcher::with_limits(
            RecordingSource::with_latency(Duration::from_secs(3)),
            Duration::from_secs(10),
            4,
        );

        let records = fetcher
            .collect_sequential(&ids(&["a", "b", "c"]))
            .await
            .unwrap();
        assert_eq!(records.len(), 3);

        let starts = fetcher.source().start_times();
        // Gap is measured start-to-start, so response latency does not add to it.
        assert_eq!(starts[1] - starts[0], Duration::from_secs(10));
        assert_eq!(starts[2] - starts[1], Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_slow_response_is_not_padded() {
        let fetcher = Fetcher::with_limits(
            RecordingSource::with_latency(Duration::from_secs(15)),
            Duration::from_secs(10),
            4,
        );

        fetcher.collect_sequential(&ids(&["a", "b"])).await.unwrap();

        let starts = fetcher.source().start_times();
        assert_eq!(starts[1] - starts[0], Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_are_listed_in_order_with_delay() {
        let fetcher = Fetcher::with_limits(
            RecordingSource::default(),
            Duration::from_millis(500),
            4,
        );
        let range = PageRange::new(3, 5, 20, &PagesConfig::default()).unwrap();

        let pages = fetcher
            .collect_pages(Section::Community, &range)
            .await
            .unwrap();

        let listed: Vec<u64> = pages.iter().map(|p| p["page"].as_u64().unwrap()).collect();
        assert_eq!(listed, vec![3, 4, 5]);
        assert_eq!(pages[0]["perPage"], 20);

        let starts = fetcher.source().start_times();
        assert_eq!(starts[2] - starts[0], Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_respects_bound_and_order() {
        let fetcher = Fetcher::with_limits(
            RecordingSource::with_latency(Duration::from_millis(50)),
            Duration::from_secs(10),
            2,
        );
        let wanted = ids(&["a", "b", "c", "d", "e"]);

        let records = fetcher.collect_parallel(&wanted).await.unwrap();

        let got: Vec<&str> = records
            .iter()
            .map(|r| r["identifier"].as_str().unwrap())
            .collect();
        assert_eq!(got, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(fetcher.source().peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_failure_aborts_batch() {
        let source = RecordingSource {
            latency: Duration::from_millis(10),
            failing: ["b".to_string()].into_iter().collect(),
            ..RecordingSource::default()
        };
        let fetcher = Fetcher::with_limits(source, Duration::ZERO, 8);

        let result = fetcher
            .collect_details(&ids(&["a", "b", "c"]), FetchMode::Parallel)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_failure_stops_before_remaining_items() {
        let source = RecordingSource {
            failing: ["b".to_string()].into_iter().collect(),
            ..RecordingSource::default()
        };
        let fetcher = Fetcher::with_limits(source, Duration::from_secs(1), 1);

        let result = fetcher
            .collect_details(&ids(&["a", "b", "c"]), FetchMode::Sequential)
            .await;
        assert!(result.is_err());
        assert_eq!(fetcher.source().start_times().len(), 2);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let fetcher = Fetcher::with_limits(RecordingSource::default(), Duration::ZERO, 0);
        assert_eq!(fetcher.max_concurrent, 1);
    }
}
