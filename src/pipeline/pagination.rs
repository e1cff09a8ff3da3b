//! Page count discovery for category feeds
//!
//! The first page of a feed is fetched once: its pagination control tells how
//! many pages exist and its HTML is handed on so page 1 is not fetched twice.

use crate::model::CategoryKey;
use crate::pipeline::events::{FetchTarget, PipelineEvent};
use crate::pipeline::orchestrator::RunContext;
use crate::site::{pagina_param, SiteLanguage};
use crate::{NetworkError, ParseError};
use scraper::{ElementRef, Html, Selector};

const PAGINATION_SELECTOR: &str = ".pagination";
const PAGINATION_LINK_SELECTOR: &str = ".pagination a[href]";
const ITEM_SELECTOR: &str = ".movie_list_item";

/// Outcome of discovering a category
#[derive(Debug, Clone)]
pub struct Discovery {
    pub page_count: u32,
    pub first_page: Result<String, NetworkError>,
}

/// Reads the number of pages from a feed's first page
///
/// Returns `None` when a pagination control is present but none of the known
/// layouts match and the page lists no items either.
///
/// Recognized layouts, in order:
/// 1. no pagination control: a single page
/// 2. the "last page" link, whose href carries the last `pagina` value
/// 3. the largest `pagina` value among the control's links
/// 4. the largest numeric link text
/// 5. an unreadable control on a page that still lists items: a single page
pub fn page_count(html: &str, language: SiteLanguage) -> Option<u32> {
    let document = Html::parse_document(html);

    let control = Selector::parse(PAGINATION_SELECTOR).ok()?;
    if document.select(&control).next().is_none() {
        return Some(1);
    }

    let link_selector = Selector::parse(PAGINATION_LINK_SELECTOR).ok()?;
    let links: Vec<ElementRef<'_>> = document.select(&link_selector).collect();

    let last_page_label = language.last_page_label();
    let last_page = links
        .iter()
        .filter(|a| {
            a.value()
                .attr("title")
                .map(|title| title.trim().to_lowercase() == last_page_label)
                .unwrap_or(false)
        })
        .find_map(|a| a.value().attr("href").and_then(pagina_param));
    if let Some(count) = last_page {
        return Some(count.max(1));
    }

    let max_param = links
        .iter()
        .filter_map(|a| a.value().attr("href").and_then(pagina_param))
        .max();
    if let Some(count) = max_param {
        return Some(count.max(1));
    }

    let max_text = links
        .iter()
        .filter_map(|a| a.text().collect::<String>().trim().parse::<u32>().ok())
        .max();
    if let Some(count) = max_text {
        return Some(count.max(1));
    }

    let items = Selector::parse(ITEM_SELECTOR).ok()?;
    if document.select(&items).next().is_some() {
        return Some(1);
    }

    None
}

/// Fetches the first page of a category and works out its page count
///
/// A failed first page yields a count of 1 and the error. An unrecognized
/// pagination layout degrades to a single page, and a count above
/// `max_pages` is cut down to it; both are reported as layout errors.
pub async fn discover(ctx: &RunContext, username: &str, key: CategoryKey) -> Discovery {
    let url = ctx.urls.feed_url(username, key, 1);
    let max_pages = ctx.options.max_pages;

    match ctx.fetcher.fetch(url.as_str(), FetchTarget::page(key, 1)).await {
        Ok(html) => {
            let count = match page_count(&html, ctx.options.language) {
                Some(count) if count <= max_pages => count,
                Some(count) => {
                    tracing::warn!(
                        "{} claims {} pages; fetching the first {} only",
                        key,
                        count,
                        max_pages
                    );
                    report_unrecognized(ctx, key);
                    max_pages
                }
                None => {
                    report_unrecognized(ctx, key);
                    1
                }
            };
            tracing::debug!("{} has {} page(s)", key, count);

            Discovery {
                page_count: count,
                first_page: Ok(html),
            }
        }
        Err(e) => {
            tracing::warn!("Could not fetch first page of {}: {}", key, e);
            Discovery {
                page_count: 1,
                first_page: Err(e),
            }
        }
    }
}

fn report_unrecognized(ctx: &RunContext, key: CategoryKey) {
    ctx.sink
        .emit(PipelineEvent::Parse(ParseError::UnrecognizedLayout {
            category: key,
            page: 1,
        }));
}
