use filmow_export::pipeline::events::{AttemptOutcome, FetchTarget};
use filmow_export::pipeline::{
    build_http_client, PageFetcher, PipelineEvent, RecordingEventSink, RetryPolicy,
};
use filmow_export::{NetworkError, RunOptions};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(policy: RetryPolicy, timeout: Duration, sink: Arc<RecordingEventSink>) -> PageFetcher {
    let client = build_http_client(&RunOptions::default()).unwrap();
    PageFetcher::new(client, 2, policy, timeout, sink)
}

fn quick_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
    }
}

fn attempt_outcomes(sink: &RecordingEventSink) -> Vec<AttemptOutcome> {
    sink.events()
        .into_iter()
        .filter_map(|event| match event {
            PipelineEvent::FetchAttempt { outcome, .. } => Some(outcome),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingEventSink::new());
    let fetcher = fetcher(quick_retries(3), Duration::from_secs(5), sink.clone());

    let body = fetcher
        .fetch(&format!("{}/flaky", server.uri()), FetchTarget::Profile)
        .await
        .unwrap();
    assert_eq!(body, "ok");

    let outcomes = attempt_outcomes(&sink);
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(outcomes[0], AttemptOutcome::Transient(_)));
    assert_eq!(outcomes[1], AttemptOutcome::Success);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingEventSink::new());
    let fetcher = fetcher(quick_retries(5), Duration::from_secs(5), sink.clone());

    let err = fetcher
        .fetch(&format!("{}/missing", server.uri()), FetchTarget::Profile)
        .await
        .unwrap_err();

    assert!(!err.is_transient());
    assert_eq!(err.status(), Some(404));
    assert_eq!(attempt_outcomes(&sink).len(), 1);
}

#[tokio::test]
async fn test_exhausted_retries_are_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingEventSink::new());
    let fetcher = fetcher(quick_retries(3), Duration::from_secs(5), sink);

    let err = fetcher
        .fetch(&format!("{}/down", server.uri()), FetchTarget::Profile)
        .await
        .unwrap_err();

    match err {
        NetworkError::Transient { attempts, reason, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(reason, "HTTP 500");
        }
        other => panic!("expected a transient failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingEventSink::new());
    let fetcher = fetcher(quick_retries(1), Duration::from_millis(200), sink.clone());

    let err = fetcher
        .fetch(&format!("{}/slow", server.uri()), FetchTarget::Profile)
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert!(matches!(
        attempt_outcomes(&sink)[0],
        AttemptOutcome::Transient(_)
    ));
}
