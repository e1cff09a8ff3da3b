use crate::model::media::{Category, CategoryKey, MediaItem, MediaType};
use crate::NetworkError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// How the fetch of one page ended
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Fetched,
    Failed(NetworkError),
}

/// Contribution of one feed page to its category
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub key: CategoryKey,
    pub page: u32,
    pub items: Vec<MediaItem>,
    /// The page links to the page after it
    pub has_next_page: bool,
    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn fetched(key: CategoryKey, page: u32, items: Vec<MediaItem>, has_next_page: bool) -> Self {
        Self {
            key,
            page,
            items,
            has_next_page,
            outcome: PageOutcome::Fetched,
        }
    }

    pub fn failed(key: CategoryKey, page: u32, error: NetworkError) -> Self {
        Self {
            key,
            page,
            items: Vec::new(),
            has_next_page: false,
            outcome: PageOutcome::Failed(error),
        }
    }
}

/// Completeness of one category after aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    /// Every discovered page was fetched
    Complete,
    /// Some pages failed but at least one succeeded
    Partial,
    /// No page could be fetched
    Failed,
}

/// Per-category fetch statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    /// Page count found by pagination discovery
    pub pages_expected: u32,
    pub pages_fetched: u32,
    /// Distinct items after deduplication
    pub items_found: usize,
    /// Occurrences that replaced an earlier item with the same id
    pub duplicates_merged: usize,
    /// Pages that never produced a result, ascending
    pub failed_pages: Vec<u32>,
    pub status: CategoryStatus,
}

impl CategoryStats {
    /// Stats for a category that produced nothing at all
    pub fn failed(pages_expected: u32) -> Self {
        Self {
            pages_expected,
            pages_fetched: 0,
            items_found: 0,
            duplicates_merged: 0,
            failed_pages: (1..=pages_expected).collect(),
            status: CategoryStatus::Failed,
        }
    }
}

/// Sorted items of one category together with their stats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCollection {
    pub items: Vec<MediaItem>,
    pub stats: CategoryStats,
}

/// Result of one extraction run across all selected categories
///
/// Assembled once by the orchestrator and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSnapshot {
    username: String,
    taken_at: DateTime<Utc>,
    categories: BTreeMap<CategoryKey, CategoryCollection>,
}

impl CollectionSnapshot {
    /// Assembles a snapshot, cross-referencing favorites first
    ///
    /// Watched items whose id also appears in the favorites feed of the same
    /// media type are flagged as favorites. Nothing is deduplicated across
    /// categories.
    pub fn assemble(
        username: impl Into<String>,
        taken_at: DateTime<Utc>,
        mut categories: BTreeMap<CategoryKey, CategoryCollection>,
    ) -> Self {
        for media_type in [MediaType::Movie, MediaType::Tv] {
            let favorites: HashSet<u64> = categories
                .get(&CategoryKey::new(media_type, Category::Favorite))
                .map(|c| c.items.iter().map(|item| item.id).collect())
                .unwrap_or_default();

            if let Some(watched) = categories.get_mut(&CategoryKey::new(media_type, Category::Watched))
            {
                for item in &mut watched.items {
                    item.favorite = favorites.contains(&item.id);
                }
            }
        }

        Self {
            username: username.into(),
            taken_at,
            categories,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Ordered items of a category; empty if it was not selected
    pub fn items(&self, key: CategoryKey) -> &[MediaItem] {
        self.categories
            .get(&key)
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn stats(&self, key: CategoryKey) -> Option<&CategoryStats> {
        self.categories.get(&key).map(|c| &c.stats)
    }

    /// Selected categories in export order
    pub fn categories(&self) -> impl Iterator<Item = (CategoryKey, &CategoryCollection)> {
        self.categories.iter().map(|(key, c)| (*key, c))
    }

    pub fn total_items(&self) -> usize {
        self.categories.values().map(|c| c.items.len()).sum()
    }
}
