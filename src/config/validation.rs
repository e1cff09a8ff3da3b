use crate::config::types::{
    Config, ExportConfig, ExportFormat, ExportOptions, RunOptions, ScraperConfig,
};
use crate::pipeline::{MediaFilter, RetryPolicy, SortKey};
use crate::site::{FeedUrls, SiteLanguage};
use crate::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// Largest accepted worker pool
pub const MAX_WORKERS: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    config.run_options()?;
    config.export_options()?;
    Ok(())
}

impl Config {
    /// Converts the scraper and ordering settings into validated run options
    pub fn run_options(&self) -> Result<RunOptions, ConfigError> {
        let options = run_options_from(&self.scraper, &self.export)?;
        options.validate()?;
        Ok(options)
    }

    /// Converts the export settings into typed export options
    pub fn export_options(&self) -> Result<ExportOptions, ConfigError> {
        export_options_from(&self.export)
    }
}

impl RunOptions {
    /// Checks ranges and the site root
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count < 1 || self.worker_count > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount(self.worker_count));
        }

        if self.request_timeout_secs < 1 {
            return Err(ConfigError::InvalidTimeout(self.request_timeout_secs));
        }

        validate_retry_policy(&self.retry)?;

        if self.max_pages < 1 {
            return Err(ConfigError::Validation(
                "max_pages must be >= 1".to_string(),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty".to_string(),
            ));
        }

        FeedUrls::new(&self.base_url)?;

        Ok(())
    }
}

fn run_options_from(scraper: &ScraperConfig, export: &ExportConfig) -> Result<RunOptions, ConfigError> {
    Ok(RunOptions {
        worker_count: scraper.worker_count,
        request_timeout_secs: scraper.request_timeout,
        retry: RetryPolicy {
            max_attempts: scraper.max_attempts,
            initial_backoff: Duration::from_millis(scraper.initial_backoff_ms),
            max_backoff: Duration::from_millis(scraper.max_backoff_ms),
        },
        max_pages: scraper.max_pages,
        sort_key: export.sort.parse::<SortKey>()?,
        media_filter: export.media.parse::<MediaFilter>()?,
        language: scraper.language.parse::<SiteLanguage>()?,
        base_url: scraper.base_url.trim().to_string(),
        user_agent: scraper.user_agent.clone(),
    })
}

fn validate_retry_policy(policy: &RetryPolicy) -> Result<(), ConfigError> {
    if policy.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            policy.max_attempts
        )));
    }

    if policy.initial_backoff > policy.max_backoff {
        return Err(ConfigError::Validation(format!(
            "initial_backoff_ms ({}) cannot exceed max_backoff_ms ({})",
            policy.initial_backoff.as_millis(),
            policy.max_backoff.as_millis()
        )));
    }

    Ok(())
}

fn export_options_from(export: &ExportConfig) -> Result<ExportOptions, ConfigError> {
    if export.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    let mut formats = Vec::new();
    for name in &export.formats {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => formats.push(ExportFormat::Json),
            "csv" => formats.push(ExportFormat::Csv),
            "xlsx" => formats.push(ExportFormat::Xlsx),
            "all" => formats.extend([ExportFormat::Json, ExportFormat::Csv, ExportFormat::Xlsx]),
            _ => {
                return Err(ConfigError::Validation(format!(
                    "Unknown export format '{}' (expected json, csv, xlsx or all)",
                    name
                )))
            }
        }
    }

    if formats.is_empty() {
        return Err(ConfigError::Validation(
            "At least one export format is required".to_string(),
        ));
    }

    formats.sort();
    formats.dedup();

    Ok(ExportOptions {
        output_dir: PathBuf::from(export.output_dir.trim()),
        formats,
    })
}
