//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a run, including:
//! - Building the HTTP client with the configured user agent and language
//! - Bounding concurrency with a fixed-width worker pool
//! - Classifying failures as transient or permanent
//! - Retrying transient failures with exponential backoff

use crate::config::RunOptions;
use crate::pipeline::events::{AttemptOutcome, EventSink, FetchTarget, PipelineEvent};
use crate::NetworkError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use url::Url;

/// How often and how patiently transient failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub initial_backoff: Duration,

    /// Upper bound for any single delay
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay to wait after attempt number `attempt` (1-based) failed
    ///
    /// Doubles on every attempt, capped at `max_backoff`.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(16),
        }
    }
}

/// Result of a single HTTP attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Body of a 2xx response
    Success(String),

    /// Worth retrying: timeout, 5xx, 429, connection trouble
    TransientFailure(String),

    /// Retrying cannot help: 404 and other client errors, bad URLs
    PermanentFailure {
        reason: String,
        status: Option<u16>,
    },
}

impl FetchOutcome {
    fn to_attempt_outcome(&self) -> AttemptOutcome {
        match self {
            Self::Success(_) => AttemptOutcome::Success,
            Self::TransientFailure(reason) => AttemptOutcome::Transient(reason.clone()),
            Self::PermanentFailure { reason, .. } => AttemptOutcome::Permanent(reason.clone()),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The per-request timeout is applied by [`PageFetcher`], so the client
/// itself only bounds connection setup.
///
/// # Example
///
/// ```no_run
/// use filmow_export::config::RunOptions;
/// use filmow_export::pipeline::build_http_client;
///
/// let client = build_http_client(&RunOptions::default()).unwrap();
/// ```
pub fn build_http_client(options: &RunOptions) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(options.language.accept_language()),
    );

    let connect_timeout = Duration::from_secs(options.request_timeout_secs.clamp(1, 10));

    Client::builder()
        .user_agent(options.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Classifies a non-success HTTP status
///
/// Returns `None` for 2xx statuses.
///
/// | Status | Outcome |
/// |--------|---------|
/// | 5xx | Transient |
/// | 429, 408 | Transient |
/// | 404 and other 4xx | Permanent |
/// | Unfollowed 3xx | Permanent |
pub fn classify_status(status: StatusCode) -> Option<FetchOutcome> {
    if status.is_success() {
        return None;
    }

    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        return Some(FetchOutcome::TransientFailure(format!("HTTP {}", status.as_u16())));
    }

    Some(FetchOutcome::PermanentFailure {
        reason: format!("HTTP {}", status.as_u16()),
        status: Some(status.as_u16()),
    })
}

/// Classifies a request that produced no response at all
fn classify_request_error(error: &reqwest::Error) -> FetchOutcome {
    if error.is_timeout() {
        FetchOutcome::TransientFailure("Request timeout".to_string())
    } else if error.is_connect() {
        FetchOutcome::TransientFailure(format!("Connection failed: {}", error))
    } else if error.is_builder() || error.is_redirect() {
        FetchOutcome::PermanentFailure {
            reason: error.to_string(),
            status: None,
        }
    } else {
        FetchOutcome::TransientFailure(error.to_string())
    }
}

/// Performs retrieval of single pages over a shared worker pool
///
/// The pool is a FIFO semaphore of `worker_count` permits. A permit covers a
/// single attempt; it is released while waiting out a backoff so that other
/// requests can use the slot.
pub struct PageFetcher {
    client: Client,
    pool: Semaphore,
    policy: RetryPolicy,
    timeout: Duration,
    sink: Arc<dyn EventSink>,
}

impl PageFetcher {
    pub fn new(
        client: Client,
        worker_count: usize,
        policy: RetryPolicy,
        timeout: Duration,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            client,
            pool: Semaphore::new(worker_count.max(1)),
            policy,
            timeout,
            sink,
        }
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Response body
    /// * `Err(NetworkError::Permanent)` - First non-retryable failure
    /// * `Err(NetworkError::Transient)` - Retry budget exhausted
    pub async fn fetch(&self, url: &str, target: FetchTarget) -> Result<String, NetworkError> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                let reason = format!("Malformed URL: {}", e);
                self.sink.emit(PipelineEvent::FetchAttempt {
                    target,
                    attempt: 1,
                    outcome: AttemptOutcome::Permanent(reason.clone()),
                    latency: Duration::ZERO,
                });
                return Err(NetworkError::Permanent {
                    url: url.to_string(),
                    reason,
                    status: None,
                });
            }
        };

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 1..=max_attempts {
            let (outcome, latency) = {
                let _permit = match self.pool.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return Err(NetworkError::Permanent {
                            url: url.to_string(),
                            reason: "Worker pool closed".to_string(),
                            status: None,
                        })
                    }
                };
                let started = Instant::now();
                let outcome = self.attempt(&parsed).await;
                (outcome, started.elapsed())
            };

            self.sink.emit(PipelineEvent::FetchAttempt {
                target,
                attempt,
                outcome: outcome.to_attempt_outcome(),
                latency,
            });

            match outcome {
                FetchOutcome::Success(body) => return Ok(body),
                FetchOutcome::PermanentFailure { reason, status } => {
                    return Err(NetworkError::Permanent {
                        url: url.to_string(),
                        reason,
                        status,
                    });
                }
                FetchOutcome::TransientFailure(reason) => {
                    last_reason = reason;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.backoff_after(attempt)).await;
                    }
                }
            }
        }

        Err(NetworkError::Transient {
            url: url.to_string(),
            reason: last_reason,
            attempts: max_attempts,
        })
    }

    /// Sends one GET request and classifies what came back
    async fn attempt(&self, url: &Url) -> FetchOutcome {
        let response = match self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_request_error(&e),
        };

        if let Some(outcome) = classify_status(response.status()) {
            return outcome;
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success(body),
            Err(e) if e.is_timeout() => {
                FetchOutcome::TransientFailure("Request timeout".to_string())
            }
            Err(e) => FetchOutcome::TransientFailure(format!("Failed to read body: {}", e)),
        }
    }
}
