use crate::model::{Category, CategoryKey, MediaType};
use crate::ConfigError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Language of the site interface and of exported labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteLanguage {
    #[default]
    Pt,
    En,
}

impl SiteLanguage {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::En => "en",
        }
    }

    /// Value sent as the `Accept-Language` header
    pub fn accept_language(&self) -> &'static str {
        match self {
            Self::Pt => "pt-BR,pt;q=0.9",
            Self::En => "en-US,en;q=0.9",
        }
    }

    /// `title` attribute of the pagination link pointing at the last page
    pub fn last_page_label(&self) -> &'static str {
        match self {
            Self::Pt => "última página",
            Self::En => "last page",
        }
    }

    /// Human-readable name of a category, used as export sheet/section name
    pub fn category_label(&self, key: CategoryKey) -> &'static str {
        match (self, key.media_type, key.category) {
            (Self::Pt, MediaType::Movie, Category::Watched) => "Filmes - Já vi",
            (Self::Pt, MediaType::Movie, Category::Favorite) => "Filmes - Favoritos",
            (Self::Pt, MediaType::Movie, Category::Wishlist) => "Filmes - Quero ver",
            (Self::Pt, MediaType::Tv, Category::Watched) => "Séries - Já vi",
            (Self::Pt, MediaType::Tv, Category::Favorite) => "Séries - Favoritos",
            (Self::Pt, MediaType::Tv, Category::Wishlist) => "Séries - Quero ver",
            (Self::En, MediaType::Movie, Category::Watched) => "Movies - Watched",
            (Self::En, MediaType::Movie, Category::Favorite) => "Movies - Favorites",
            (Self::En, MediaType::Movie, Category::Wishlist) => "Movies - To Watch",
            (Self::En, MediaType::Tv, Category::Watched) => "TV Shows - Watched",
            (Self::En, MediaType::Tv, Category::Favorite) => "TV Shows - Favorites",
            (Self::En, MediaType::Tv, Category::Wishlist) => "TV Shows - To Watch",
        }
    }
}

impl fmt::Display for SiteLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SiteLanguage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" | "pt-br" => Ok(Self::Pt),
            "en" | "en-us" => Ok(Self::En),
            _ => Err(ConfigError::InvalidLanguage(s.to_string())),
        }
    }
}
