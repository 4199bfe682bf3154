// src/lib.rs

//! artcrawl: incremental crawl-and-merge of an art community catalogue.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
pub use models::Config;
