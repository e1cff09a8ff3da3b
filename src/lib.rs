//! Filmow-Export: collection extractor for Filmow user profiles
//!
//! This crate fetches the six public list feeds of a Filmow profile
//! (movies and TV shows, each split into watched, favorites and wishlist),
//! parses them into typed media records, merges paginated results under
//! concurrent fetching and hands a single sorted snapshot to exporters.

pub mod config;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod site;
pub mod state;

use model::CategoryKey;
use thiserror::Error;

/// Top-level error type for the command-line tool
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a run before any category is processed
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid sort key '{0}' (expected title, rating, favorite or none)")]
    InvalidSortKey(String),

    #[error("Invalid worker count {0} (expected 1 to 64)")]
    InvalidWorkerCount(u32),

    #[error("Invalid request timeout {0}s (expected at least 1 second)")]
    InvalidTimeout(u64),

    #[error("Invalid media filter '{0}' (expected all, movies or tv)")]
    InvalidMediaFilter(String),

    #[error("Invalid site language '{0}' (expected pt or en)")]
    InvalidLanguage(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Fetch failures, classified by whether a retry can help
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Transient failure for {url} after {attempts} attempt(s): {reason}")]
    Transient {
        url: String,
        reason: String,
        attempts: u32,
    },

    #[error("Permanent failure for {url}: {reason}")]
    Permanent {
        url: String,
        reason: String,
        status: Option<u16>,
    },
}

impl NetworkError {
    /// Returns true if the failure was retryable
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// HTTP status code behind a permanent failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Permanent { status, .. } => *status,
            Self::Transient { .. } => None,
        }
    }
}

/// Non-fatal parsing problems; both degrade instead of failing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unrecognized pagination layout for {category} page {page}")]
    UnrecognizedLayout { category: CategoryKey, page: u32 },

    #[error("Malformed item in {category} page {page}: {reason}")]
    MalformedItem {
        category: CategoryKey,
        page: u32,
        reason: String,
    },
}

/// Profile-level failures that make the whole run pointless
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("User '{username}' was not found")]
    NotFound { username: String },

    #[error("Profile of '{username}' is private")]
    Private { username: String },
}

/// Result type alias for run operations
pub type Result<T> = std::result::Result<T, RunError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, RunOptions};
pub use model::{
    Category, CategoryStats, CategoryStatus, CollectionSnapshot, MediaItem, MediaType,
};
pub use pipeline::{run, Orchestrator, RunOutcome, RunReport};
pub use site::SiteLanguage;
