//! Pipeline entry points.
//!
//! - `Aggregator`: filter detail records against the ledger and build indexes
//! - `Pipeline`: run one crawl from page listing to index merge

pub mod aggregate;
pub mod crawl;

pub use aggregate::{Aggregate, Aggregator};
pub use crawl::{CrawlReport, CrawlRequest, CrawlState, Pipeline};
