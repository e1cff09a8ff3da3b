use crate::common::{list_page, mount_page, mount_profile, options_for};
use filmow_export::model::CategoryKey;
use filmow_export::pipeline::{
    MediaFilter, Orchestrator, PipelineEvent, RecordingEventSink, SortKey,
};
use filmow_export::{CategoryStatus, ParseError, ProfileError, RunError};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WATCHED: &str = "/usuario/alice/filmes/ja-vi/";
const FAVORITES: &str = "/usuario/alice/filmes/favoritos/";

fn ids(items: &[filmow_export::MediaItem]) -> Vec<u64> {
    items.iter().map(|item| item.id).collect()
}

#[tokio::test]
async fn test_alice_end_to_end() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;
    mount_page(&server, WATCHED, 1, list_page(&[(10, "Beta"), (11, "alpha")], None)).await;
    mount_page(&server, FAVORITES, 1, list_page(&[(10, "Beta"), (12, "Gamma")], None)).await;

    let mut options = options_for(&server);
    options.worker_count = 2;
    let orchestrator = Orchestrator::new(options).unwrap();
    let report = orchestrator
        .run(
            "alice",
            &[CategoryKey::MOVIES_WATCHED, CategoryKey::MOVIES_FAVORITE],
        )
        .await
        .unwrap();

    let snapshot = &report.snapshot;
    assert_eq!(snapshot.username(), "alice");
    assert!(report.outcome.is_complete());

    let watched = snapshot.items(CategoryKey::MOVIES_WATCHED);
    assert_eq!(ids(watched), vec![11, 10]);
    assert_eq!(watched[0].title, "alpha");

    let favorites = snapshot.items(CategoryKey::MOVIES_FAVORITE);
    assert_eq!(ids(favorites), vec![10, 12]);

    // Watched entries that are also favorites are flagged
    assert!(watched[1].favorite);
    assert!(!watched[0].favorite);

    assert_eq!(
        watched[0].source_url,
        Some(format!("{}/item-t11/", server.uri()))
    );
    assert_eq!(
        watched[0].poster_url,
        Some(format!("{}/covers/11.jpg", server.uri()))
    );

    let stats = snapshot.stats(CategoryKey::MOVIES_WATCHED).unwrap();
    assert_eq!(stats.status, CategoryStatus::Complete);
    assert_eq!(stats.pages_expected, 1);
    assert_eq!(stats.items_found, 2);
}

#[tokio::test]
async fn test_failed_middle_page_gives_partial_category() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;
    mount_page(&server, WATCHED, 1, list_page(&[(1, "A"), (2, "B")], Some(3))).await;
    mount_page(&server, WATCHED, 3, list_page(&[(5, "E"), (6, "F")], Some(3))).await;

    Mock::given(method("GET"))
        .and(path(WATCHED))
        .and(query_param("pagina", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let mut options = options_for(&server);
    options.sort_key = SortKey::None;
    let sink = Arc::new(RecordingEventSink::new());
    let orchestrator = Orchestrator::with_sink(options, sink.clone()).unwrap();

    let report = orchestrator
        .run("alice", &[CategoryKey::MOVIES_WATCHED])
        .await
        .unwrap();

    let snapshot = &report.snapshot;
    let mut found = ids(snapshot.items(CategoryKey::MOVIES_WATCHED));
    found.sort_unstable();
    assert_eq!(found, vec![1, 2, 5, 6]);

    let stats = snapshot.stats(CategoryKey::MOVIES_WATCHED).unwrap();
    assert_eq!(stats.status, CategoryStatus::Partial);
    assert_eq!(stats.failed_pages, vec![2]);
    assert_eq!(stats.pages_expected, 3);
    assert_eq!(stats.pages_fetched, 2);

    assert!(!report.outcome.is_complete());

    let finished: Vec<CategoryKey> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            PipelineEvent::CategoryFinished { category, .. } => Some(category),
            _ => None,
        })
        .collect();
    assert_eq!(finished, vec![CategoryKey::MOVIES_WATCHED]);
}

#[tokio::test]
async fn test_duplicates_across_pages_are_merged() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;
    mount_page(&server, WATCHED, 1, list_page(&[(1, "A"), (2, "B")], Some(2))).await;
    mount_page(&server, WATCHED, 2, list_page(&[(2, "B"), (3, "C")], Some(2))).await;

    let orchestrator = Orchestrator::new(options_for(&server)).unwrap();
    let report = orchestrator
        .run("alice", &[CategoryKey::MOVIES_WATCHED])
        .await
        .unwrap();

    let items = report.snapshot.items(CategoryKey::MOVIES_WATCHED);
    assert_eq!(ids(items), vec![1, 2, 3]);

    let stats = report.snapshot.stats(CategoryKey::MOVIES_WATCHED).unwrap();
    assert_eq!(stats.duplicates_merged, 1);
    assert_eq!(stats.status, CategoryStatus::Complete);
}

#[tokio::test]
async fn test_page_without_pagination_is_single_page() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;
    mount_page(&server, WATCHED, 1, list_page(&[(1, "Only")], None)).await;

    Mock::given(method("GET"))
        .and(path(WATCHED))
        .and(query_param("pagina", "2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingEventSink::new());
    let orchestrator = Orchestrator::with_sink(options_for(&server), sink.clone()).unwrap();
    let report = orchestrator
        .run("alice", &[CategoryKey::MOVIES_WATCHED])
        .await
        .unwrap();

    let stats = report.snapshot.stats(CategoryKey::MOVIES_WATCHED).unwrap();
    assert_eq!(stats.pages_expected, 1);
    assert_eq!(stats.status, CategoryStatus::Complete);
    assert!(!sink
        .events()
        .iter()
        .any(|event| matches!(event, PipelineEvent::Parse(_))));
}

#[tokio::test]
async fn test_unrecognized_pagination_degrades_to_one_page() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;
    mount_page(
        &server,
        WATCHED,
        1,
        r#"<html><body><div class="pagination"><span>…</span></div></body></html>"#.to_string(),
    )
    .await;

    let sink = Arc::new(RecordingEventSink::new());
    let orchestrator = Orchestrator::with_sink(options_for(&server), sink.clone()).unwrap();
    let report = orchestrator
        .run("alice", &[CategoryKey::MOVIES_WATCHED])
        .await
        .unwrap();

    let stats = report.snapshot.stats(CategoryKey::MOVIES_WATCHED).unwrap();
    assert_eq!(stats.pages_expected, 1);
    assert_eq!(stats.items_found, 0);
    assert!(sink.events().contains(&PipelineEvent::Parse(
        ParseError::UnrecognizedLayout {
            category: CategoryKey::MOVIES_WATCHED,
            page: 1,
        }
    )));
}

#[tokio::test]
async fn test_oversized_page_count_is_capped() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;

    let first = list_page(&[(1, "A")], None).replace(
        "</body>",
        r#"<div class="pagination"><a href="?pagina=2">2</a><a href="?pagina=4294967295" title="última página">»</a></div></body>"#,
    );
    mount_page(&server, WATCHED, 1, first).await;
    mount_page(&server, WATCHED, 2, list_page(&[(2, "B")], Some(3))).await;
    mount_page(&server, WATCHED, 3, list_page(&[(3, "C")], Some(3))).await;

    Mock::given(method("GET"))
        .and(path(WATCHED))
        .and(query_param("pagina", "4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut options = options_for(&server);
    options.max_pages = 3;
    let sink = Arc::new(RecordingEventSink::new());
    let orchestrator = Orchestrator::with_sink(options, sink.clone()).unwrap();
    let report = orchestrator
        .run("alice", &[CategoryKey::MOVIES_WATCHED])
        .await
        .unwrap();

    let stats = report.snapshot.stats(CategoryKey::MOVIES_WATCHED).unwrap();
    assert_eq!(stats.pages_expected, 3);
    assert_eq!(stats.pages_fetched, 3);
    assert_eq!(stats.status, CategoryStatus::Complete);
    assert_eq!(ids(report.snapshot.items(CategoryKey::MOVIES_WATCHED)), vec![1, 2, 3]);
    assert!(sink.events().contains(&PipelineEvent::Parse(
        ParseError::UnrecognizedLayout {
            category: CategoryKey::MOVIES_WATCHED,
            page: 1,
        }
    )));
}

#[tokio::test]
async fn test_malformed_items_are_reported() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;

    let mut html = list_page(&[(1, "Good")], None);
    html = html.replace(
        "</ul>",
        r#"<li class="movie_list_item"><span class="wrapper"><img alt="No id"></span></li></ul>"#,
    );
    mount_page(&server, WATCHED, 1, html).await;

    let sink = Arc::new(RecordingEventSink::new());
    let orchestrator = Orchestrator::with_sink(options_for(&server), sink.clone()).unwrap();
    let report = orchestrator
        .run("alice", &[CategoryKey::MOVIES_WATCHED])
        .await
        .unwrap();

    assert_eq!(ids(report.snapshot.items(CategoryKey::MOVIES_WATCHED)), vec![1]);
    let malformed = sink
        .events()
        .into_iter()
        .filter(|event| {
            matches!(
                event,
                PipelineEvent::Parse(ParseError::MalformedItem { page: 1, .. })
            )
        })
        .count();
    assert_eq!(malformed, 1);
}

#[tokio::test]
async fn test_failed_category_does_not_affect_siblings() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;
    mount_page(&server, WATCHED, 1, list_page(&[(1, "A")], None)).await;
    // Favorites are not mounted: every request there is a 404

    let orchestrator = Orchestrator::new(options_for(&server)).unwrap();
    let report = orchestrator
        .run(
            "alice",
            &[CategoryKey::MOVIES_WATCHED, CategoryKey::MOVIES_FAVORITE],
        )
        .await
        .unwrap();

    let snapshot = &report.snapshot;
    assert_eq!(
        snapshot.stats(CategoryKey::MOVIES_WATCHED).unwrap().status,
        CategoryStatus::Complete
    );
    let favorites = snapshot.stats(CategoryKey::MOVIES_FAVORITE).unwrap();
    assert_eq!(favorites.status, CategoryStatus::Failed);
    assert_eq!(favorites.failed_pages, vec![1]);
    assert!(snapshot.items(CategoryKey::MOVIES_FAVORITE).is_empty());
}

#[tokio::test]
async fn test_slow_category_does_not_delay_siblings() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;
    mount_page(&server, WATCHED, 1, list_page(&[(1, "A")], None)).await;

    Mock::given(method("GET"))
        .and(path(FAVORITES))
        .and(query_param("pagina", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(list_page(&[(2, "B")], None))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingEventSink::new());
    let orchestrator = Orchestrator::with_sink(options_for(&server), sink.clone()).unwrap();
    let report = orchestrator
        .run(
            "alice",
            &[CategoryKey::MOVIES_FAVORITE, CategoryKey::MOVIES_WATCHED],
        )
        .await
        .unwrap();

    assert!(report.outcome.is_complete());

    let finished: Vec<CategoryKey> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            PipelineEvent::CategoryFinished { category, .. } => Some(category),
            _ => None,
        })
        .collect();
    assert_eq!(
        finished,
        vec![CategoryKey::MOVIES_WATCHED, CategoryKey::MOVIES_FAVORITE]
    );
}

#[tokio::test]
async fn test_media_filter_skips_excluded_categories() {
    let server = MockServer::start().await;
    mount_profile(&server, "alice").await;

    let mut options = options_for(&server);
    options.media_filter = MediaFilter::TvOnly;
    let orchestrator = Orchestrator::new(options).unwrap();
    let report = orchestrator.run("alice", &CategoryKey::ALL).await.unwrap();

    let keys: Vec<CategoryKey> = report.snapshot.categories().map(|(key, _)| key).collect();
    assert_eq!(
        keys,
        vec![
            CategoryKey::TV_WATCHED,
            CategoryKey::TV_FAVORITE,
            CategoryKey::TV_WISHLIST
        ]
    );
}

#[tokio::test]
async fn test_missing_profile_aborts_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usuario/ghost/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(options_for(&server)).unwrap();
    let result = orchestrator.run("ghost", &CategoryKey::ALL).await;

    assert!(matches!(
        result,
        Err(RunError::Profile(ProfileError::NotFound { ref username })) if username == "ghost"
    ));
}

#[tokio::test]
async fn test_private_profile_aborts_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usuario/carol/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div class="perfil-privado">Este perfil é privado</div>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usuario/carol/filmes/ja-vi/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(options_for(&server)).unwrap();
    let result = orchestrator.run("carol", &CategoryKey::ALL).await;

    assert!(matches!(
        result,
        Err(RunError::Profile(ProfileError::Private { .. }))
    ));
}

#[tokio::test]
async fn test_forbidden_profile_is_private() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usuario/dave/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(options_for(&server)).unwrap();
    let result = orchestrator.run("dave", &CategoryKey::ALL).await;

    assert!(matches!(
        result,
        Err(RunError::Profile(ProfileError::Private { .. }))
    ));
}

#[tokio::test]
async fn test_flaky_profile_probe_does_not_abort() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usuario/alice/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, WATCHED, 1, list_page(&[(1, "A")], None)).await;

    let orchestrator = Orchestrator::new(options_for(&server)).unwrap();
    let report = orchestrator
        .run("alice", &[CategoryKey::MOVIES_WATCHED])
        .await
        .unwrap();

    assert_eq!(ids(report.snapshot.items(CategoryKey::MOVIES_WATCHED)), vec![1]);
}
