//! Site module for Filmow-specific addressing
//!
//! This module knows how the site lays out its URLs and which locale rules
//! apply when reading its pages:
//! - Profile and feed URL templates
//! - Resolving relative links found in list markup
//! - Language-dependent labels

mod language;
mod urls;

pub use language::SiteLanguage;
pub use urls::{id_from_href, pagina_param, resolve_link, FeedUrls};

/// Default site root
pub const DEFAULT_BASE_URL: &str = "https://filmow.com";
