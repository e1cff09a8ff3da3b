use crate::pipeline::{MediaFilter, RetryPolicy, SortKey};
use crate::site::{SiteLanguage, DEFAULT_BASE_URL};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for the page count read from a pagination control
pub const DEFAULT_MAX_PAGES: u32 = 10_000;

/// Browser-like user agent; the site serves reduced markup to unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure, as read from TOML
///
/// Every field has a default, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub export: ExportConfig,
}

/// Network and site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Width of the shared worker pool
    pub worker_count: u32,

    /// Per-request timeout (seconds)
    pub request_timeout: u64,

    /// Attempts per request, including the first one
    pub max_attempts: u32,

    /// Delay after the first failed attempt (milliseconds)
    pub initial_backoff_ms: u64,

    /// Upper bound for a single retry delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Most pages fetched per category
    pub max_pages: u32,

    /// Site root
    pub base_url: String,

    /// Interface language: "pt" or "en"
    pub language: String,

    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            request_timeout: 10,
            max_attempts: 5,
            initial_backoff_ms: 1000,
            max_backoff_ms: 16000,
            max_pages: DEFAULT_MAX_PAGES,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "pt".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// What to write and how to order it
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExportConfig {
    /// One of title, rating, favorite, none
    pub sort: String,

    /// One of all, movies, tv
    pub media: String,

    /// Directory receiving the export files
    pub output_dir: String,

    /// Any of json, csv, xlsx, all
    pub formats: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sort: "title".to_string(),
            media: "all".to_string(),
            output_dir: "output".to_string(),
            formats: vec!["all".to_string()],
        }
    }
}

/// Typed, validated settings of one extraction run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub worker_count: u32,
    pub request_timeout_secs: u64,
    pub retry: RetryPolicy,
    pub max_pages: u32,
    pub sort_key: SortKey,
    pub media_filter: MediaFilter,
    pub language: SiteLanguage,
    pub base_url: String,
    pub user_agent: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        let scraper = ScraperConfig::default();
        Self {
            worker_count: scraper.worker_count,
            request_timeout_secs: scraper.request_timeout,
            retry: RetryPolicy {
                max_attempts: scraper.max_attempts,
                initial_backoff: Duration::from_millis(scraper.initial_backoff_ms),
                max_backoff: Duration::from_millis(scraper.max_backoff_ms),
            },
            max_pages: scraper.max_pages,
            sort_key: SortKey::default(),
            media_filter: MediaFilter::default(),
            language: SiteLanguage::default(),
            base_url: scraper.base_url,
            user_agent: scraper.user_agent,
        }
    }
}

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

/// Typed export settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    /// Distinct formats, in a fixed order
    pub formats: Vec<ExportFormat>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            formats: vec![ExportFormat::Json, ExportFormat::Csv, ExportFormat::Xlsx],
        }
    }
}
