use filmow_export::config::RunOptions;
use filmow_export::pipeline::RetryPolicy;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Options pointing at the mock server, with near-instant retries
pub fn options_for(server: &MockServer) -> RunOptions {
    RunOptions {
        base_url: server.uri(),
        worker_count: 4,
        request_timeout_secs: 5,
        retry: RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        },
        ..RunOptions::default()
    }
}

/// A list page with the given `(id, title)` entries
///
/// `pages` renders a pagination control linking to pages 1..=pages.
pub fn list_page(items: &[(u64, &str)], pages: Option<u32>) -> String {
    let mut html = String::from("<html><body><ul class=\"movie-list\">");
    for (id, title) in items {
        html.push_str(&format!(
            r#"<li class="movie_list_item" data-movie-pk="{id}">
                <span class="wrapper">
                    <a class="cover" href="/item-t{id}/"><img src="/covers/{id}.jpg" alt="{title}"></a>
                </span>
            </li>"#,
            id = id,
            title = title
        ));
    }
    html.push_str("</ul>");

    if let Some(pages) = pages {
        html.push_str(r#"<div class="pagination"><ul>"#);
        for page in 1..=pages {
            html.push_str(&format!(r#"<li><a href="?pagina={0}">{0}</a></li>"#, page));
        }
        html.push_str(&format!(
            r#"<li><a href="?pagina={}" title="última página">»</a></li>"#,
            pages
        ));
        html.push_str("</ul></div>");
    }

    html.push_str("</body></html>");
    html
}

/// Serves a public profile page for `username`
pub async fn mount_profile(server: &MockServer, username: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/usuario/{}/", username)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(r#"<div class="profile">{}</div>"#, username)),
        )
        .mount(server)
        .await;
}

/// Serves one feed page
pub async fn mount_page(server: &MockServer, feed_path: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .and(query_param("pagina", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}
