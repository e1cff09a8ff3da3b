//! Configuration module for Filmow-Export
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turns them into typed [`RunOptions`] and [`ExportOptions`].
//!
//! # Example
//!
//! ```no_run
//! use filmow_export::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("filmow.toml")).unwrap();
//! let options = config.run_options().unwrap();
//! println!("Using {} workers", options.worker_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExportConfig, ExportFormat, ExportOptions, RunOptions, ScraperConfig,
    DEFAULT_MAX_PAGES, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, MAX_WORKERS};
