//! Observability events emitted by the pipeline
//!
//! The pipeline only defines the shape of its events; where they go is up to
//! the [`EventSink`] handed to the orchestrator. [`TracingEventSink`] forwards
//! them to `tracing`, [`RecordingEventSink`] keeps them in memory.

use crate::model::{CategoryKey, CategoryStats};
use crate::state::CategoryState;
use crate::ParseError;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// What a single fetch is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    /// The profile probe made before any category starts
    Profile,
    /// One page of a category feed
    Page { category: CategoryKey, page: u32 },
}

impl FetchTarget {
    pub fn page(category: CategoryKey, page: u32) -> Self {
        Self::Page { category, page }
    }

    pub fn category(&self) -> Option<CategoryKey> {
        match self {
            Self::Profile => None,
            Self::Page { category, .. } => Some(*category),
        }
    }

    pub fn page_number(&self) -> Option<u32> {
        match self {
            Self::Profile => None,
            Self::Page { page, .. } => Some(*page),
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => f.write_str("profile"),
            Self::Page { category, page } => write!(f, "{} page {}", category, page),
        }
    }
}

/// Outcome of one HTTP attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Transient(String),
    Permanent(String),
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Transient(_) => "transient",
            Self::Permanent(_) => "permanent",
        }
    }
}

/// Structured event emitted while a run progresses
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// One HTTP attempt finished
    FetchAttempt {
        target: FetchTarget,
        attempt: u32,
        outcome: AttemptOutcome,
        latency: Duration,
    },

    /// Markup could not be read as expected; the pipeline degraded
    Parse(ParseError),

    /// A category moved to its next state
    StateChanged {
        category: CategoryKey,
        from: CategoryState,
        to: CategoryState,
    },

    /// A category reached its terminal state
    CategoryFinished {
        category: CategoryKey,
        stats: CategoryStats,
    },
}

/// Receiver of pipeline events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to `tracing` with structured fields
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::FetchAttempt {
                target,
                attempt,
                outcome,
                latency,
            } => {
                let category = target.category().map(|c| c.slug()).unwrap_or("profile");
                let page = target.page_number().unwrap_or(0);
                let latency_ms = latency.as_millis() as u64;
                match &outcome {
                    AttemptOutcome::Success => tracing::trace!(
                        category,
                        page,
                        attempt,
                        outcome = outcome.as_str(),
                        latency_ms,
                        "Fetched {}",
                        target
                    ),
                    AttemptOutcome::Transient(reason) => tracing::debug!(
                        category,
                        page,
                        attempt,
                        outcome = outcome.as_str(),
                        latency_ms,
                        "Transient failure fetching {}: {}",
                        target,
                        reason
                    ),
                    AttemptOutcome::Permanent(reason) => tracing::warn!(
                        category,
                        page,
                        attempt,
                        outcome = outcome.as_str(),
                        latency_ms,
                        "Permanent failure fetching {}: {}",
                        target,
                        reason
                    ),
                }
            }
            PipelineEvent::Parse(error) => match &error {
                ParseError::UnrecognizedLayout { category, page } => {
                    tracing::warn!(category = category.slug(), page, "{}", error)
                }
                ParseError::MalformedItem { category, page, .. } => {
                    tracing::warn!(category = category.slug(), page, "{}", error)
                }
            },
            PipelineEvent::StateChanged { category, from, to } => {
                tracing::debug!(category = category.slug(), "{} -> {}", from, to)
            }
            PipelineEvent::CategoryFinished { category, stats } => tracing::info!(
                category = category.slug(),
                pages = stats.pages_fetched,
                items = stats.items_found,
                failed_pages = stats.failed_pages.len(),
                "Finished {} ({:?})",
                category,
                stats.status
            ),
        }
    }
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far
    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: PipelineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
