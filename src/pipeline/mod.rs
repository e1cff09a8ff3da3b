//! Extraction pipeline for Filmow list feeds
//!
//! This module contains the core extraction logic, including:
//! - HTTP fetching with retry and a shared worker pool
//! - Page count discovery and item extraction from list HTML
//! - Per-category aggregation and sorting
//! - Overall run orchestration

mod aggregator;
pub mod events;
mod extractor;
mod fetcher;
mod orchestrator;
mod pagination;
mod sorter;

pub use aggregator::{spawn_aggregator, CollectionAggregator};
pub use events::{EventSink, PipelineEvent, RecordingEventSink, TracingEventSink};
pub use extractor::{
    has_next_page, is_private_profile, parse_count, parse_rating_label, split_titles,
    ItemExtractor, PageExtraction,
};
pub use fetcher::{build_http_client, classify_status, FetchOutcome, PageFetcher, RetryPolicy};
pub use orchestrator::{Orchestrator, RunContext, RunOutcome, RunReport};
pub use pagination::{discover, page_count, Discovery};
pub use sorter::{fold_title, sort, MediaFilter, SortKey};

use crate::config::RunOptions;
use crate::model::CategoryKey;
use crate::RunError;

/// Extracts all six categories of a user's collection
///
/// This is the main entry point for a run. It will:
/// 1. Validate the options and build the HTTP client
/// 2. Check that the profile exists and is public
/// 3. Discover and fetch every page of each category
/// 4. Merge, deduplicate and sort each category
///
/// # Arguments
///
/// * `username` - Public Filmow username
/// * `options` - Validated run options
///
/// # Returns
///
/// * `Ok(RunReport)` - Snapshot plus aggregate completeness
/// * `Err(RunError)` - Invalid options, or a missing or private profile
pub async fn run(username: &str, options: RunOptions) -> Result<RunReport, RunError> {
    Orchestrator::new(options)?
        .run(username, &CategoryKey::ALL)
        .await
}
