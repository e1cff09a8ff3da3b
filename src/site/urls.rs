use crate::model::CategoryKey;
use crate::ConfigError;
use url::Url;

/// Builds profile and feed URLs under a site root
///
/// Feed URLs follow the site's routes:
/// `{base}/usuario/{username}/{filmes|series}/{ja-vi|favoritos|quero-ver}/?pagina={n}`
#[derive(Debug, Clone)]
pub struct FeedUrls {
    base: Url,
}

impl FeedUrls {
    /// Creates a URL builder rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the root does not parse or is not
    /// an http(s) URL that can carry a path.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", base_url, e)))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Base URL '{}' must use http or https",
                base_url
            )));
        }

        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(format!(
                "Base URL '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Public profile page of a user
    pub fn profile_url(&self, username: &str) -> Url {
        self.with_segments(&["usuario", username, ""])
    }

    /// One page of a category feed (pages are 1-based)
    pub fn feed_url(&self, username: &str, key: CategoryKey, page: u32) -> Url {
        let mut url = self.with_segments(&[
            "usuario",
            username,
            key.media_type.path_segment(),
            key.category.path_segment(),
            "",
        ]);
        url.query_pairs_mut()
            .append_pair("pagina", &page.to_string());
        url
    }

    fn with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Cannot fail: `new` rejects cannot-be-a-base roots
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be ignored:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs (lazy-loading placeholders)
/// - fragment-only links
/// - Invalid URLs or non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Reads the `pagina` query parameter of a pagination link
pub fn pagina_param(href: &str) -> Option<u32> {
    let (_, query) = href.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);

    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name == "pagina" {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Extracts the numeric id from a title link such as `/o-poderoso-chefao-t1453/`
pub fn id_from_href(href: &str) -> Option<u64> {
    let path = href.split(['?', '#']).next()?;
    let slug = path.trim_end_matches('/').rsplit('/').next()?;
    let (_, digits) = slug.rsplit_once("-t")?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}
