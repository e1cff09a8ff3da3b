//! HTML extraction of media items from list feed pages
//!
//! Each list page renders its entries as `.movie_list_item` elements:
//!
//! ```html
//! <li class="movie_list_item" data-movie-pk="1453">
//!   <span class="wrapper">
//!     <a class="cover" href="/o-poderoso-chefao-t1453/" title="O Poderoso Chefão">
//!       <img src="https://cdn.filmow.com/1453.jpg" alt="O Poderoso Chefão (The Godfather)">
//!     </a>
//!   </span>
//!   <span class="tip star-rating star-rating-small stars" title="Nota: 4,5 estrelas"></span>
//!   <span class="favorite-count">1.234</span>
//!   <span class="release">1972</span>
//! </li>
//! ```
//!
//! Only the id and the title are required; an entry without them is skipped
//! and reported, the rest of the page is still used.

use crate::model::{CategoryKey, MediaItem};
use crate::site::{id_from_href, pagina_param, resolve_link};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const ITEM_SELECTOR: &str = ".movie_list_item";
const LINK_SELECTORS: [&str; 2] = [".wrapper a[href]", "a[href]"];
const IMAGE_SELECTORS: [&str; 2] = [".wrapper img", "img"];
const RATING_SELECTOR: &str = ".star-rating[title]";
const FAVORITE_COUNT_SELECTOR: &str = ".favorite-count";
const RELEASE_SELECTOR: &str = ".release";
const TITLE_SELECTOR: &str = ".title";
const PRIVATE_PROFILE_SELECTOR: &str = ".private-profile, .perfil-privado";
const PAGINATION_LINK_SELECTOR: &str = ".pagination a[href]";

/// Words marking a parenthesized TV season label rather than an original title
const SEASON_WORDS: [&str; 2] = ["Temporada", "Season"];

/// Items read from one page plus the reasons entries were skipped
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub items: Vec<MediaItem>,
    pub malformed: Vec<String>,
}

/// Parses list pages into media items
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    base_url: Url,
}

impl ItemExtractor {
    /// Creates an extractor resolving relative links against `base_url`
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// Extracts the media items of one page
    ///
    /// Media type and category are taken from `key`, never from the markup.
    /// Skipped entries are logged.
    ///
    /// # Example
    ///
    /// ```
    /// use filmow_export::model::CategoryKey;
    /// use filmow_export::pipeline::ItemExtractor;
    /// use url::Url;
    ///
    /// let html = r#"<ul><li class="movie_list_item" data-movie-pk="7">
    ///     <span class="wrapper"><a href="/heat-t7/"><img alt="Fogo Contra Fogo (Heat)"></a></span>
    /// </li></ul>"#;
    /// let extractor = ItemExtractor::new(Url::parse("https://filmow.com").unwrap());
    /// let items = extractor.extract(html, CategoryKey::MOVIES_WISHLIST);
    /// assert_eq!(items[0].original_title, "Heat");
    /// ```
    pub fn extract(&self, html: &str, key: CategoryKey) -> Vec<MediaItem> {
        let extraction = self.extract_with_report(html, key);
        for reason in &extraction.malformed {
            tracing::warn!("Skipping malformed item in {}: {}", key, reason);
        }
        extraction.items
    }

    /// Extracts the media items of one page and reports skipped entries
    pub fn extract_with_report(&self, html: &str, key: CategoryKey) -> PageExtraction {
        let document = Html::parse_document(html);
        let mut extraction = PageExtraction::default();

        let Ok(item_selector) = Selector::parse(ITEM_SELECTOR) else {
            return extraction;
        };

        for (position, element) in document.select(&item_selector).enumerate() {
            match self.parse_item(element, key) {
                Ok(item) => extraction.items.push(item),
                Err(reason) => extraction
                    .malformed
                    .push(format!("entry #{}: {}", position + 1, reason)),
            }
        }

        extraction
    }

    /// Parses a single `.movie_list_item` element
    fn parse_item(&self, element: ElementRef<'_>, key: CategoryKey) -> Result<MediaItem, String> {
        let link = first_of(element, &LINK_SELECTORS);
        let href = link.and_then(|a| a.value().attr("href"));
        let image = first_of(element, &IMAGE_SELECTORS);

        let id = element
            .value()
            .attr("data-movie-pk")
            .and_then(|pk| pk.trim().parse::<u64>().ok())
            .or_else(|| href.and_then(id_from_href))
            .ok_or_else(|| "missing id".to_string())?;

        let full_title = image
            .and_then(|img| img.value().attr("alt"))
            .map(str::to_string)
            .filter(|alt| !alt.trim().is_empty())
            .or_else(|| {
                link.and_then(|a| a.value().attr("title"))
                    .map(str::to_string)
                    .filter(|t| !t.trim().is_empty())
            })
            .or_else(|| first(element, TITLE_SELECTOR).map(text_of))
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| format!("missing title for id {}", id))?;

        let (title, original_title) = split_titles(&full_title);

        let rating = if key.category.has_user_rating() {
            first(element, RATING_SELECTOR)
                .and_then(|span| span.value().attr("title"))
                .and_then(parse_rating_label)
        } else {
            None
        };

        let favorite_count =
            first(element, FAVORITE_COUNT_SELECTOR).and_then(|span| parse_count(&text_of(span)));

        let year = element
            .value()
            .attr("data-year")
            .and_then(parse_year)
            .or_else(|| first(element, RELEASE_SELECTOR).and_then(|e| parse_year(&text_of(e))));

        // Lazy-loaded covers keep the real address in data-src
        let poster_url = image.and_then(|img| {
            ["data-src", "src"]
                .iter()
                .find_map(|attr| img.value().attr(attr))
                .and_then(|src| resolve_link(src, &self.base_url))
        });

        let source_url = href.and_then(|h| resolve_link(h, &self.base_url));

        MediaItem::builder(key, id, title)
            .original_title(original_title)
            .year(year)
            .rating(rating)
            .favorite_count(favorite_count)
            .poster_url(poster_url)
            .source_url(source_url)
            .build()
            .ok_or_else(|| format!("blank title for id {}", id))
    }
}

/// Returns true if the profile page says the profile is private
pub fn is_private_profile(html: &str) -> bool {
    let document = Html::parse_document(html);
    Selector::parse(PRIVATE_PROFILE_SELECTOR)
        .map(|selector| document.select(&selector).next().is_some())
        .unwrap_or(false)
}

/// Returns true if the page links to the page after `page`
pub fn has_next_page(html: &str, page: u32) -> bool {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(PAGINATION_LINK_SELECTOR) else {
        return false;
    };

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(pagina_param)
        .any(|target| target == page + 1)
}

/// Splits "National (Original)" into its two titles
///
/// TV seasons read "Série (1ª Temporada) (Original)"; the season suffix stays
/// with the national title. Without an original title both halves are equal.
pub fn split_titles(full_title: &str) -> (String, String) {
    let full = full_title.trim();

    if let Some(inner) = full.strip_suffix(')') {
        if let Some(open) = inner.rfind(" (") {
            let national = inner[..open].trim();
            let original = inner[open + 2..].trim();
            let is_season = SEASON_WORDS.iter().any(|word| original.contains(word));
            if !national.is_empty() && !original.is_empty() && !is_season {
                return (national.to_string(), original.to_string());
            }
        }
    }

    (full.to_string(), full.to_string())
}

/// Reads the rating out of a label like "Nota: 4,5 estrelas" or "Rating: 4.5"
pub fn parse_rating_label(label: &str) -> Option<f32> {
    label.split_whitespace().find_map(|token| {
        let token = token.trim_matches(|c: char| !c.is_ascii_digit());
        if token.is_empty() {
            return None;
        }
        token.replace(',', ".").parse::<f32>().ok()
    })
}

/// Reads a counter, ignoring thousands separators ("1.234", "1,234")
pub fn parse_count(text: &str) -> Option<u32> {
    let digits: String = text
        .split_whitespace()
        .next()?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Finds the first four-digit run in a text
fn parse_year(text: &str) -> Option<u16> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}

fn first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

fn first_of<'a>(element: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|css| first(element, css))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
