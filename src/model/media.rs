use serde::{Serialize, Serializer};
use std::fmt;

/// Kind of media a feed lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment the site uses for this media type
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Movie => "filmes",
            Self::Tv => "series",
        }
    }
}

/// List a media item belongs to on the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Watched,
    Favorite,
    Wishlist,
}

impl Category {
    /// Path segment the site uses for this list
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Watched => "ja-vi",
            Self::Favorite => "favoritos",
            Self::Wishlist => "quero-ver",
        }
    }

    /// Whether entries in this list carry the user's own rating
    pub fn has_user_rating(&self) -> bool {
        matches!(self, Self::Watched | Self::Favorite)
    }
}

/// Identifies one feed: a (media type, list) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryKey {
    pub media_type: MediaType,
    pub category: Category,
}

impl CategoryKey {
    pub const MOVIES_WATCHED: Self = Self::new(MediaType::Movie, Category::Watched);
    pub const MOVIES_FAVORITE: Self = Self::new(MediaType::Movie, Category::Favorite);
    pub const MOVIES_WISHLIST: Self = Self::new(MediaType::Movie, Category::Wishlist);
    pub const TV_WATCHED: Self = Self::new(MediaType::Tv, Category::Watched);
    pub const TV_FAVORITE: Self = Self::new(MediaType::Tv, Category::Favorite);
    pub const TV_WISHLIST: Self = Self::new(MediaType::Tv, Category::Wishlist);

    /// All six feeds, in export order
    pub const ALL: [Self; 6] = [
        Self::MOVIES_WATCHED,
        Self::MOVIES_FAVORITE,
        Self::MOVIES_WISHLIST,
        Self::TV_WATCHED,
        Self::TV_FAVORITE,
        Self::TV_WISHLIST,
    ];

    pub const fn new(media_type: MediaType, category: Category) -> Self {
        Self {
            media_type,
            category,
        }
    }

    /// Stable identifier used in logs, file names and JSON keys
    pub fn slug(&self) -> &'static str {
        match (self.media_type, self.category) {
            (MediaType::Movie, Category::Watched) => "movies-watched",
            (MediaType::Movie, Category::Favorite) => "movies-favorite",
            (MediaType::Movie, Category::Wishlist) => "movies-wishlist",
            (MediaType::Tv, Category::Watched) => "tv-watched",
            (MediaType::Tv, Category::Favorite) => "tv-favorite",
            (MediaType::Tv, Category::Wishlist) => "tv-wishlist",
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// Serialized as its slug so snapshots can use it as a JSON map key.
impl Serialize for CategoryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

/// A movie or TV show entry extracted from a list feed
///
/// Only `id` and `title` are mandatory. Everything the markup may omit is
/// an `Option` and stays `None` when absent; `original_title` falls back to
/// `title`. Instances are built through [`MediaItemBuilder`], which enforces
/// the rating range once so consumers never re-check it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    /// Site identifier, unique within one category after aggregation
    pub id: u64,

    /// Title as shown on the site (usually the Brazilian release title)
    pub title: String,

    /// Original title, or `title` when the site shows only one
    pub original_title: String,

    pub year: Option<u16>,

    pub media_type: MediaType,

    pub category: Category,

    /// User rating in [0, 5]
    pub rating: Option<f32>,

    /// Number of users who marked the title as favorite
    pub favorite_count: Option<u32>,

    pub poster_url: Option<String>,

    pub source_url: Option<String>,

    /// Whether the user lists this title among their favorites
    pub favorite: bool,
}

impl MediaItem {
    /// Starts building an item for the given feed
    pub fn builder(key: CategoryKey, id: u64, title: impl Into<String>) -> MediaItemBuilder {
        MediaItemBuilder::new(key, id, title)
    }

    pub fn key(&self) -> CategoryKey {
        CategoryKey::new(self.media_type, self.category)
    }
}

/// Builder enforcing the construction-time invariants of [`MediaItem`]
#[derive(Debug, Clone)]
pub struct MediaItemBuilder {
    key: CategoryKey,
    id: u64,
    title: String,
    original_title: Option<String>,
    year: Option<u16>,
    rating: Option<f32>,
    favorite_count: Option<u32>,
    poster_url: Option<String>,
    source_url: Option<String>,
}

impl MediaItemBuilder {
    pub fn new(key: CategoryKey, id: u64, title: impl Into<String>) -> Self {
        Self {
            key,
            id,
            title: title.into(),
            original_title: None,
            year: None,
            rating: None,
            favorite_count: None,
            poster_url: None,
            source_url: None,
        }
    }

    pub fn original_title(mut self, original_title: impl Into<String>) -> Self {
        self.original_title = Some(original_title.into());
        self
    }

    pub fn year(mut self, year: Option<u16>) -> Self {
        self.year = year;
        self
    }

    pub fn rating(mut self, rating: Option<f32>) -> Self {
        self.rating = rating;
        self
    }

    pub fn favorite_count(mut self, favorite_count: Option<u32>) -> Self {
        self.favorite_count = favorite_count;
        self
    }

    pub fn poster_url(mut self, poster_url: Option<String>) -> Self {
        self.poster_url = poster_url;
        self
    }

    pub fn source_url(mut self, source_url: Option<String>) -> Self {
        self.source_url = source_url;
        self
    }

    /// Finishes the item
    ///
    /// Returns `None` if the title is blank. A rating outside [0, 5] is
    /// dropped rather than clamped, since it means the markup was misread.
    pub fn build(self) -> Option<MediaItem> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return None;
        }

        let original_title = self
            .original_title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| title.clone());

        let rating = match self.rating {
            Some(r) if (0.0..=5.0).contains(&r) => Some(r),
            Some(r) => {
                tracing::debug!(
                    "Dropping out-of-range rating {} for item {} in {}",
                    r,
                    self.id,
                    self.key
                );
                None
            }
            None => None,
        };

        Some(MediaItem {
            id: self.id,
            title,
            original_title,
            year: self.year,
            media_type: self.key.media_type,
            category: self.key.category,
            rating,
            favorite_count: self.favorite_count,
            poster_url: self.poster_url,
            source_url: self.source_url,
            favorite: self.key.category == Category::Favorite,
        })
    }
}
