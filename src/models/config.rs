//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Bounds for requested page ranges
    #[serde(default)]
    pub pages: PagesConfig,

    /// Index file locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        self.crawler.base_url()?;

        let pages = &self.pages;
        if pages.max_page == 0 {
            return Err(AppError::validation("pages.max_page must be > 0"));
        }
        if pages.min_per_page == 0 || pages.min_per_page > pages.max_per_page {
            return Err(AppError::validation(
                "pages.min_per_page must be > 0 and <= pages.max_per_page",
            ));
        }
        if !pages.accepts_per_page(pages.default_per_page) {
            return Err(AppError::validation(format!(
                "pages.default_per_page ({}) must be even and within {}..={}",
                pages.default_per_page, pages.min_per_page, pages.max_per_page
            )));
        }

        let paths = &self.paths;
        for (name, file) in [
            ("paths.ledger_file", &paths.ledger_file),
            ("paths.items_file", &paths.items_file),
            ("paths.tags_file", &paths.tags_file),
            ("paths.categories_file", &paths.categories_file),
        ] {
            if file.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Root URL of the content API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Minimum gap between the starts of consecutive sequential requests
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum in-flight detail requests in parallel mode
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl CrawlerConfig {
    /// Parsed API root.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| {
            AppError::config(format!("crawler.base_url '{}' is invalid: {e}", self.base_url))
        })
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Allowed page numbers and page sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Highest page number that may be requested
    #[serde(default = "defaults::max_page")]
    pub max_page: u32,

    /// Smallest allowed items-per-page
    #[serde(default = "defaults::min_per_page")]
    pub min_per_page: u32,

    /// Largest allowed items-per-page
    #[serde(default = "defaults::max_per_page")]
    pub max_per_page: u32,

    /// Items-per-page used when none is given
    #[serde(default = "defaults::max_per_page")]
    pub default_per_page: u32,
}

impl PagesConfig {
    /// Whether `count` is an even value inside the configured bounds.
    pub fn accepts_per_page(&self, count: u32) -> bool {
        (self.min_per_page..=self.max_per_page).contains(&count) && count % 2 == 0
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            max_page: defaults::max_page(),
            min_per_page: defaults::min_per_page(),
            max_per_page: defaults::max_per_page(),
            default_per_page: defaults::max_per_page(),
        }
    }
}

/// Locations of the ledger and index files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding every index file
    #[serde(default = "defaults::storage_dir")]
    pub storage_dir: PathBuf,

    #[serde(default = "defaults::ledger_file")]
    pub ledger_file: String,

    #[serde(default = "defaults::items_file")]
    pub items_file: String,

    #[serde(default = "defaults::tags_file")]
    pub tags_file: String,

    #[serde(default = "defaults::categories_file")]
    pub categories_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            storage_dir: defaults::storage_dir(),
            ledger_file: defaults::ledger_file(),
            items_file: defaults::items_file(),
            tags_file: defaults::tags_file(),
            categories_file: defaults::categories_file(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn base_url() -> String {
        "https://www.artstation.com".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; artcrawl/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        10_000
    }
    pub fn max_concurrent() -> usize {
        8
    }

    // Page bounds
    pub fn max_page() -> u32 {
        500
    }
    pub fn min_per_page() -> u32 {
        10
    }
    pub fn max_per_page() -> u32 {
        100
    }

    // Storage layout
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn ledger_file() -> String {
        "ledger.json".into()
    }
    pub fn items_file() -> String {
        "items.json".into()
    }
    pub fn tags_file() -> String {
        "tags.json".into()
    }
    pub fn categories_file() -> String {
        "categories.json".into()
    }
}
