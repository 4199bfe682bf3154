// src/models/mod.rs

//! Domain models for the crawler.
//!
//! This module contains all data structures used throughout the crate,
//! organized by their primary purpose.

mod config;
mod item;
mod range;

// Re-export all public types
pub use config::{Config, CrawlerConfig, PagesConfig, PathsConfig};
pub use item::{Category, DetailRecord, ItemSummary, ListEntry, ListPage};
pub use range::{PageRange, Section};
