//! Run orchestration
//!
//! A run probes the profile once, then drives every selected category as an
//! independent task:
//! - discover the page count from page 1
//! - fetch pages 2..=N concurrently over the shared worker pool
//! - merge results in the category's aggregation task
//! - sort the merged list
//!
//! A failing or panicking category only affects its own entry in the
//! snapshot.

use crate::config::RunOptions;
use crate::model::{
    CategoryCollection, CategoryKey, CategoryStats, CategoryStatus, CollectionSnapshot, PageResult,
};
use crate::pipeline::aggregator::spawn_aggregator;
use crate::pipeline::events::{EventSink, FetchTarget, PipelineEvent, TracingEventSink};
use crate::pipeline::extractor::{has_next_page, is_private_profile, ItemExtractor};
use crate::pipeline::fetcher::{build_http_client, PageFetcher};
use crate::pipeline::pagination::discover;
use crate::pipeline::sorter::sort;
use crate::site::FeedUrls;
use crate::state::CategoryState;
use crate::{ConfigError, NetworkError, ParseError, ProfileError, RunError};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Everything a run needs, built once and shared by reference
pub struct RunContext {
    pub options: RunOptions,
    pub urls: FeedUrls,
    pub fetcher: PageFetcher,
    pub extractor: ItemExtractor,
    pub sink: Arc<dyn EventSink>,
}

impl RunContext {
    /// Builds the context from validated options
    pub fn new(options: RunOptions, sink: Arc<dyn EventSink>) -> Result<Self, RunError> {
        options.validate()?;

        let urls = FeedUrls::new(&options.base_url)?;
        let client = build_http_client(&options)?;
        let fetcher = PageFetcher::new(
            client,
            options.worker_count as usize,
            options.retry,
            Duration::from_secs(options.request_timeout_secs),
            Arc::clone(&sink),
        );
        let extractor = ItemExtractor::new(urls.base().clone());

        Ok(Self {
            options,
            urls,
            fetcher,
            extractor,
            sink,
        })
    }

    /// Turns a fetched page into a page result, reporting skipped entries
    fn page_result(&self, key: CategoryKey, page: u32, html: &str) -> PageResult {
        let extraction = self.extractor.extract_with_report(html, key);
        for reason in extraction.malformed {
            self.sink.emit(PipelineEvent::Parse(ParseError::MalformedItem {
                category: key,
                page,
                reason,
            }));
        }

        tracing::debug!("{} page {}: {} item(s)", key, page, extraction.items.len());
        PageResult::fetched(key, page, extraction.items, has_next_page(html, page))
    }

    fn advance(&self, key: CategoryKey, state: &mut CategoryState, next: CategoryState) {
        match state.advance(key, next) {
            Ok(new_state) => {
                self.sink.emit(PipelineEvent::StateChanged {
                    category: key,
                    from: *state,
                    to: new_state,
                });
                *state = new_state;
            }
            Err(e) => tracing::error!("{}", e),
        }
    }
}

/// Aggregate completeness of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every selected category is complete
    Complete,
    /// Some categories are partial or failed; their data is still included
    Incomplete {
        partial: Vec<CategoryKey>,
        failed: Vec<CategoryKey>,
    },
}

impl RunOutcome {
    pub fn from_snapshot(snapshot: &CollectionSnapshot) -> Self {
        let mut partial = Vec::new();
        let mut failed = Vec::new();

        for (key, collection) in snapshot.categories() {
            match collection.stats.status {
                CategoryStatus::Complete => {}
                CategoryStatus::Partial => partial.push(key),
                CategoryStatus::Failed => failed.push(key),
            }
        }

        if partial.is_empty() && failed.is_empty() {
            Self::Complete
        } else {
            Self::Incomplete { partial, failed }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Snapshot of a finished run and how complete it is
#[derive(Debug, Clone)]
pub struct RunReport {
    pub snapshot: CollectionSnapshot,
    pub outcome: RunOutcome,
}

/// Drives extraction runs for one set of options
pub struct Orchestrator {
    ctx: Arc<RunContext>,
}

impl Orchestrator {
    /// Creates an orchestrator logging its events through `tracing`
    ///
    /// # Errors
    ///
    /// Fails with `RunError::Config` on invalid options, before any network
    /// activity.
    pub fn new(options: RunOptions) -> Result<Self, RunError> {
        Self::with_sink(options, Arc::new(TracingEventSink))
    }

    /// Creates an orchestrator sending its events to `sink`
    pub fn with_sink(options: RunOptions, sink: Arc<dyn EventSink>) -> Result<Self, RunError> {
        let ctx = RunContext::new(options, sink)?;
        Ok(Self { ctx: Arc::new(ctx) })
    }

    /// Extracts the selected categories of a user's collection
    ///
    /// Categories excluded by the media filter are not fetched at all.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - Snapshot of every selected category, whatever its status
    /// * `Err(RunError::Profile)` - The user does not exist or the profile is private
    /// * `Err(RunError::Config)` - The username is blank
    pub async fn run(&self, username: &str, selected: &[CategoryKey]) -> Result<RunReport, RunError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ConfigError::Validation("Username must not be empty".to_string()).into());
        }

        tracing::info!("Starting export of '{}'", username);
        self.check_profile(username).await?;

        let filter = self.ctx.options.media_filter;
        let mut keys: Vec<CategoryKey> = selected
            .iter()
            .copied()
            .filter(|key| filter.includes(key.media_type))
            .collect();
        keys.sort();
        keys.dedup();

        let mut tasks = JoinSet::new();
        for key in keys.iter().copied() {
            let ctx = Arc::clone(&self.ctx);
            let username = username.to_string();
            tasks.spawn(async move { (key, run_category(ctx, username, key).await) });
        }

        let mut categories = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, collection)) => {
                    categories.insert(key, collection);
                }
                Err(e) => tracing::error!("Category task aborted: {}", e),
            }
        }

        // A panicked task never reports back; its category ends up failed
        for key in &keys {
            if !categories.contains_key(key) {
                let stats = CategoryStats::failed(0);
                self.ctx.sink.emit(PipelineEvent::CategoryFinished {
                    category: *key,
                    stats: stats.clone(),
                });
                categories.insert(
                    *key,
                    CategoryCollection {
                        items: Vec::new(),
                        stats,
                    },
                );
            }
        }

        let snapshot = CollectionSnapshot::assemble(username, Utc::now(), categories);
        let outcome = RunOutcome::from_snapshot(&snapshot);

        tracing::info!(
            "Export of '{}' finished: {} item(s) across {} categories",
            username,
            snapshot.total_items(),
            keys.len()
        );

        Ok(RunReport { snapshot, outcome })
    }

    /// Probes the profile page before any category starts
    ///
    /// Only a missing or private profile aborts the run; a probe that fails
    /// for any other reason is logged and the run goes on.
    async fn check_profile(&self, username: &str) -> Result<(), RunError> {
        let url = self.ctx.urls.profile_url(username);

        match self.ctx.fetcher.fetch(url.as_str(), FetchTarget::Profile).await {
            Ok(html) => {
                if is_private_profile(&html) {
                    Err(ProfileError::Private {
                        username: username.to_string(),
                    }
                    .into())
                } else {
                    Ok(())
                }
            }
            Err(e) => match e.status() {
                Some(404) => Err(ProfileError::NotFound {
                    username: username.to_string(),
                }
                .into()),
                Some(403) => Err(ProfileError::Private {
                    username: username.to_string(),
                }
                .into()),
                _ => {
                    tracing::warn!("Could not verify profile of '{}': {}", username, e);
                    Ok(())
                }
            },
        }
    }
}

/// Runs one category from discovery to its sorted list
async fn run_category(ctx: Arc<RunContext>, username: String, key: CategoryKey) -> CategoryCollection {
    let mut state = CategoryState::Pending;

    ctx.advance(key, &mut state, CategoryState::Discovering);
    let discovery = discover(&ctx, &username, key).await;
    let page_count = discovery.page_count;

    ctx.advance(key, &mut state, CategoryState::Fetching);
    let (tx, aggregator) = spawn_aggregator(key, page_count);

    let first = match discovery.first_page {
        Ok(html) => ctx.page_result(key, 1, &html),
        Err(e) => PageResult::failed(key, 1, e),
    };
    if tx.send(first).await.is_err() {
        tracing::error!("Aggregator of {} stopped early", key);
    }

    let mut pages = JoinSet::new();
    for page in 2..=page_count {
        let ctx = Arc::clone(&ctx);
        let tx = tx.clone();
        let username = username.clone();
        pages.spawn(async move {
            let result = fetch_page(&ctx, &username, key, page).await;
            if tx.send(result).await.is_err() {
                tracing::error!("Aggregator of {} stopped early", key);
            }
        });
    }
    drop(tx);

    while let Some(joined) = pages.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Page task of {} aborted: {}", key, e);
        }
    }

    ctx.advance(key, &mut state, CategoryState::Aggregating);
    let (items, stats) = match aggregator.await {
        Ok(merged) => merged,
        Err(e) => {
            tracing::error!("Aggregation of {} aborted: {}", key, e);
            (Vec::new(), CategoryStats::failed(page_count))
        }
    };

    let sort_key = ctx.options.sort_key.effective_for(key.category);
    let items = sort(&items, sort_key, ctx.options.media_filter);

    ctx.advance(key, &mut state, CategoryState::Done(stats.status));
    ctx.sink.emit(PipelineEvent::CategoryFinished {
        category: key,
        stats: stats.clone(),
    });

    CategoryCollection { items, stats }
}

async fn fetch_page(ctx: &RunContext, username: &str, key: CategoryKey, page: u32) -> PageResult {
    let url = ctx.urls.feed_url(username, key, page);
    match ctx.fetcher.fetch(url.as_str(), FetchTarget::page(key, page)).await {
        Ok(html) => ctx.page_result(key, page, &html),
        Err(e) => {
            log_failed_page(key, page, &e);
            PageResult::failed(key, page, e)
        }
    }
}

fn log_failed_page(key: CategoryKey, page: u32, error: &NetworkError) {
    if error.is_transient() {
        tracing::warn!("Giving up on {} page {}: {}", key, page, error);
    } else {
        tracing::warn!("{} page {} is unavailable: {}", key, page, error);
    }
}
