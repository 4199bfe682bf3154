//! Crawl targets: the feed section and the page window.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::PagesConfig;

/// A named content feed on the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Community,
    Trending,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Community => "community",
            Section::Trending => "trending",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "community" => Ok(Section::Community),
            "trending" => Ok(Section::Trending),
            other => Err(AppError::validation(format!("unknown section '{other}'"))),
        }
    }
}

/// Inclusive page window plus the number of items per page.
///
/// Only constructible through [`PageRange::new`], so a value in hand has
/// already passed the bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: u32,
    per_page: u32,
}

impl PageRange {
    /// Validate a requested window against the configured bounds.
    pub fn new(start: u32, end: u32, per_page: u32, bounds: &PagesConfig) -> Result<Self> {
        if start < 1 {
            return Err(AppError::invalid_range(format!(
                "start page must be >= 1, got {start}"
            )));
        }
        if end < start {
            return Err(AppError::invalid_range(format!(
                "end page {end} is before start page {start}"
            )));
        }
        if end > bounds.max_page {
            return Err(AppError::invalid_range(format!(
                "end page {end} exceeds the maximum of {}",
                bounds.max_page
            )));
        }
        if !bounds.accepts_per_page(per_page) {
            return Err(AppError::invalid_range(format!(
                "per-page count {per_page} must be even and within {}..={}",
                bounds.min_per_page, bounds.max_per_page
            )));
        }
        Ok(Self {
            start,
            end,
            per_page,
        })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Page numbers in ascending order.
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn page_count(&self) -> usize {
        (self.end - self.start + 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_parse_and_display() {
        assert_eq!("Community".parse::<Section>().unwrap(), Section::Community);
        assert_eq!("trending".parse::<Section>().unwrap(), Section::Trending);
        assert!("popular".parse::<Section>().is_err());
        assert_eq!(Section::Trending.to_string(), "trending");
    }

    #[test]
    fn test_valid_range() {
        let range = PageRange::new(2, 4, 50, &PagesConfig::default()).unwrap();
        assert_eq!(range.pages().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(range.page_count(), 3);
        assert_eq!(range.per_page(), 50);
    }

    #[test]
    fn test_single_page_range() {
        let range = PageRange::new(7, 7, 10, &PagesConfig::default()).unwrap();
        assert_eq!(range.page_count(), 1);
    }

    #[test]
    fn test_range_beyond_max_page() {
        let err = PageRange::new(600, 601, 100, &PagesConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange(_)));
    }

    #[test]
    fn test_range_rejects_zero_and_reversed() {
        let bounds = PagesConfig::default();
        assert!(PageRange::new(0, 3, 100, &bounds).is_err());
        assert!(PageRange::new(5, 4, 100, &bounds).is_err());
    }

    #[test]
    fn test_range_rejects_bad_per_page() {
        let bounds = PagesConfig::default();
        assert!(PageRange::new(1, 1, 8, &bounds).is_err());
        assert!(PageRange::new(1, 1, 102, &bounds).is_err());
        assert!(PageRange::new(1, 1, 33, &bounds).is_err());
        assert!(PageRange::new(1, 1, 10, &bounds).is_ok());
        assert!(PageRange::new(1, 1, 100, &bounds).is_ok());
    }
}
