//! Ordering and filtering of merged category lists

use crate::model::{Category, MediaItem, MediaType};
use crate::ConfigError;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sort order applied to every category list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Case- and accent-insensitive title order
    #[default]
    Title,
    /// Highest user rating first; unrated entries last
    Rating,
    /// Most favorited first
    Favorite,
    /// Keep merge order
    None,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Rating => "rating",
            Self::Favorite => "favorite",
            Self::None => "none",
        }
    }

    /// The key actually used for a category
    ///
    /// Wishlist entries carry no user rating, so a rating sort falls back to
    /// title order there.
    pub fn effective_for(self, category: Category) -> Self {
        match (self, category) {
            (Self::Rating, Category::Wishlist) => Self::Title,
            (key, _) => key,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "titulo" => Ok(Self::Title),
            "rating" | "nota" => Ok(Self::Rating),
            "favorite" | "favorites" | "favoritos" => Ok(Self::Favorite),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::InvalidSortKey(s.to_string())),
        }
    }
}

/// Which media types survive into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaFilter {
    #[default]
    All,
    MovieOnly,
    TvOnly,
}

impl MediaFilter {
    pub fn includes(&self, media_type: MediaType) -> bool {
        match self {
            Self::All => true,
            Self::MovieOnly => media_type == MediaType::Movie,
            Self::TvOnly => media_type == MediaType::Tv,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::MovieOnly => "movies",
            Self::TvOnly => "tv",
        }
    }
}

impl fmt::Display for MediaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "both" => Ok(Self::All),
            "movies" | "movie" | "movie-only" | "filmes" => Ok(Self::MovieOnly),
            "tv" | "tv-only" | "series" | "shows" => Ok(Self::TvOnly),
            _ => Err(ConfigError::InvalidMediaFilter(s.to_string())),
        }
    }
}

/// Filters and orders a merged category list
///
/// The order is total: ties under `key` fall back to merge order, then id.
pub fn sort(items: &[MediaItem], key: SortKey, filter: MediaFilter) -> Vec<MediaItem> {
    let mut indexed: Vec<(usize, &MediaItem, String)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| filter.includes(item.media_type))
        .map(|(position, item)| {
            let folded = if key == SortKey::Title {
                fold_title(&item.title)
            } else {
                String::new()
            };
            (position, item, folded)
        })
        .collect();

    indexed.sort_by(|(pos_a, a, folded_a), (pos_b, b, folded_b)| {
        let primary = match key {
            SortKey::Title => folded_a.cmp(folded_b),
            SortKey::Rating => compare_ratings(a.rating, b.rating),
            SortKey::Favorite => b
                .favorite_count
                .unwrap_or(0)
                .cmp(&a.favorite_count.unwrap_or(0)),
            SortKey::None => Ordering::Equal,
        };
        primary
            .then_with(|| pos_a.cmp(pos_b))
            .then_with(|| a.id.cmp(&b.id))
    });

    indexed.into_iter().map(|(_, item, _)| item.clone()).collect()
}

/// Descending, with absent ratings after every present one
fn compare_ratings(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Lowercases and strips diacritics ("Ávila" -> "avila")
pub fn fold_title(title: &str) -> String {
    title
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
