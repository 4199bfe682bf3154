//! Service layer for the crawler.
//!
//! This module contains the logic for:
//! - Talking to the content API (`ContentSource`, `HttpSource`)
//! - Listing pages and collecting detail records (`Fetcher`)
//! - Extracting identifiers, summaries, tags and categories (`extract`)

pub mod extract;
mod fetcher;
mod source;

pub use fetcher::{FetchMode, Fetcher};
pub use source::{ContentSource, HttpSource};
