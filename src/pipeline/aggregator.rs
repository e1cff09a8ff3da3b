//! Merging of page results into one category list
//!
//! Every category owns a single aggregation task fed through an mpsc
//! channel; page tasks only send, so no list is ever shared or locked.

use crate::model::{CategoryKey, CategoryStats, CategoryStatus, MediaItem, PageOutcome, PageResult};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Accumulates the pages of one category
///
/// Items are deduplicated by id. A later occurrence replaces the earlier one
/// in place, so the most recently merged content wins while the list keeps
/// the position of the first occurrence.
#[derive(Debug)]
pub struct CollectionAggregator {
    key: CategoryKey,
    pages_expected: u32,
    items: Vec<MediaItem>,
    index: HashMap<u64, usize>,
    fetched: BTreeSet<u32>,
    failed: BTreeSet<u32>,
    duplicates: usize,
    last_page_links_further: bool,
}

impl CollectionAggregator {
    pub fn new(key: CategoryKey, pages_expected: u32) -> Self {
        Self {
            key,
            pages_expected,
            items: Vec::new(),
            index: HashMap::new(),
            fetched: BTreeSet::new(),
            failed: BTreeSet::new(),
            duplicates: 0,
            last_page_links_further: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when the last discovered page links to a page after it
    ///
    /// The pagination control then undercounted the category.
    pub fn last_page_links_further(&self) -> bool {
        self.last_page_links_further
    }

    /// Folds one page result into the category
    pub fn merge(&mut self, result: PageResult) {
        if result.key != self.key {
            tracing::warn!(
                "Ignoring page {} of {} sent to the {} aggregator",
                result.page,
                result.key,
                self.key
            );
            return;
        }

        match result.outcome {
            PageOutcome::Failed(error) => {
                tracing::debug!("{} page {} failed: {}", self.key, result.page, error);
                if !self.fetched.contains(&result.page) {
                    self.failed.insert(result.page);
                }
            }
            PageOutcome::Fetched => {
                self.failed.remove(&result.page);
                self.fetched.insert(result.page);
                if result.page == self.pages_expected {
                    self.last_page_links_further = result.has_next_page;
                }

                for item in result.items {
                    match self.index.get(&item.id) {
                        Some(&slot) => {
                            self.items[slot] = item;
                            self.duplicates += 1;
                        }
                        None => {
                            self.index.insert(item.id, self.items.len());
                            self.items.push(item);
                        }
                    }
                }
            }
        }
    }

    /// Closes the category, returning its items in merge order and its stats
    pub fn finish(self) -> (Vec<MediaItem>, CategoryStats) {
        if self.last_page_links_further {
            tracing::warn!(
                "{} page {} links to a later page; the category may hold more than {} page(s)",
                self.key,
                self.pages_expected,
                self.pages_expected
            );
        }

        let missing = (1..=self.pages_expected).filter(|page| !self.fetched.contains(page));
        let failed_pages: Vec<u32> = missing
            .chain(self.failed.iter().copied())
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect();

        let pages_fetched = self.fetched.len() as u32;
        let status = if pages_fetched == 0 {
            CategoryStatus::Failed
        } else if failed_pages.is_empty() && pages_fetched >= self.pages_expected {
            CategoryStatus::Complete
        } else {
            CategoryStatus::Partial
        };

        let stats = CategoryStats {
            pages_expected: self.pages_expected,
            pages_fetched,
            items_found: self.items.len(),
            duplicates_merged: self.duplicates,
            failed_pages,
            status,
        };

        (self.items, stats)
    }
}

/// Starts the aggregation task of one category
///
/// The task finishes once every sender has been dropped.
pub fn spawn_aggregator(
    key: CategoryKey,
    pages_expected: u32,
) -> (
    mpsc::Sender<PageResult>,
    JoinHandle<(Vec<MediaItem>, CategoryStats)>,
) {
    let capacity = (pages_expected as usize).clamp(1, 64);
    let (tx, mut rx) = mpsc::channel::<PageResult>(capacity);

    let handle = tokio::spawn(async move {
        let mut aggregator = CollectionAggregator::new(key, pages_expected);
        while let Some(result) = rx.recv().await {
            aggregator.merge(result);
        }
        aggregator.finish()
    });

    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NetworkError;
    use std::collections::HashSet;

    const KEY: CategoryKey = CategoryKey::MOVIES_WATCHED;

    fn item(id: u64, title: &str) -> MediaItem {
        MediaItem::builder(KEY, id, title).build().unwrap()
    }

    fn page(page: u32, ids: &[u64]) -> PageResult {
        let items = ids.iter().map(|id| item(*id, &format!("Title {}", id))).collect();
        PageResult::fetched(KEY, page, items, false)
    }

    fn failure(page: u32) -> PageResult {
        PageResult::failed(
            KEY,
            page,
            NetworkError::Transient {
                url: format!("https://filmow.com/?pagina={}", page),
                reason: "HTTP 503".to_string(),
                attempts: 5,
            },
        )
    }

    #[test]
    fn test_complete_category() {
        let mut aggregator = CollectionAggregator::new(KEY, 2);
        aggregator.merge(page(2, &[3, 4]));
        aggregator.merge(page(1, &[1, 2]));

        let (items, stats) = aggregator.finish();
        assert_eq!(items.len(), 4);
        assert_eq!(stats.status, CategoryStatus::Complete);
        assert_eq!(stats.pages_fetched, 2);
        assert!(stats.failed_pages.is_empty());
    }

    #[test]
    fn test_partial_category() {
        let mut aggregator = CollectionAggregator::new(KEY, 3);
        aggregator.merge(page(1, &[1, 2]));
        aggregator.merge(failure(2));
        aggregator.merge(page(3, &[5, 6]));

        let (items, stats) = aggregator.finish();
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 5, 6]);
        assert_eq!(stats.status, CategoryStatus::Partial);
        assert_eq!(stats.failed_pages, vec![2]);
    }

    #[test]
    fn test_missing_pages_count_as_failed() {
        let mut aggregator = CollectionAggregator::new(KEY, 3);
        aggregator.merge(page(1, &[1]));

        let (_, stats) = aggregator.finish();
        assert_eq!(stats.status, CategoryStatus::Partial);
        assert_eq!(stats.failed_pages, vec![2, 3]);
    }

    #[test]
    fn test_no_successful_page_is_failed() {
        let mut aggregator = CollectionAggregator::new(KEY, 1);
        aggregator.merge(failure(1));

        let (items, stats) = aggregator.finish();
        assert!(items.is_empty());
        assert_eq!(stats.status, CategoryStatus::Failed);
        assert_eq!(stats.failed_pages, vec![1]);
    }

    #[test]
    fn test_duplicates_last_write_wins_in_first_slot() {
        let mut aggregator = CollectionAggregator::new(KEY, 2);
        aggregator.merge(PageResult::fetched(
            KEY,
            2,
            vec![item(1, "Old"), item(2, "Two")],
            false,
        ));
        aggregator.merge(PageResult::fetched(KEY, 1, vec![item(1, "New")], true));

        let (items, stats) = aggregator.finish();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[0].title, "New");
        assert_eq!(stats.duplicates_merged, 1);
        assert_eq!(stats.items_found, 2);
    }

    #[test]
    fn test_id_set_is_merge_order_independent() {
        let pages = vec![page(1, &[1, 2, 3]), page(2, &[3, 4]), page(3, &[4, 5, 1])];

        let mut forward = CollectionAggregator::new(KEY, 3);
        for p in pages.iter().cloned() {
            forward.merge(p);
        }
        let mut backward = CollectionAggregator::new(KEY, 3);
        for p in pages.into_iter().rev() {
            backward.merge(p);
        }

        let ids = |items: Vec<MediaItem>| items.into_iter().map(|i| i.id).collect::<HashSet<_>>();
        let (a, _) = forward.finish();
        let (b, _) = backward.finish();
        assert_eq!(a.len(), 5);
        assert_eq!(ids(a), ids(b));
    }

    #[test]
    fn test_last_page_with_next_link_is_flagged() {
        let mut aggregator = CollectionAggregator::new(KEY, 2);
        aggregator.merge(PageResult::fetched(KEY, 1, vec![item(1, "A")], true));
        assert!(!aggregator.last_page_links_further());

        aggregator.merge(PageResult::fetched(KEY, 2, vec![item(2, "B")], true));
        assert!(aggregator.last_page_links_further());

        let (_, stats) = aggregator.finish();
        assert_eq!(stats.status, CategoryStatus::Complete);

        let mut aggregator = CollectionAggregator::new(KEY, 2);
        aggregator.merge(PageResult::fetched(KEY, 2, vec![item(2, "B")], false));
        assert!(!aggregator.last_page_links_further());
    }

    #[test]
    fn test_foreign_results_are_ignored() {
        let mut aggregator = CollectionAggregator::new(KEY, 1);
        let stranger = MediaItem::builder(CategoryKey::TV_WATCHED, 9, "Show")
            .build()
            .unwrap();
        aggregator.merge(PageResult::fetched(
            CategoryKey::TV_WATCHED,
            1,
            vec![stranger],
            false,
        ));

        assert!(aggregator.is_empty());
        let (_, stats) = aggregator.finish();
        assert_eq!(stats.status, CategoryStatus::Failed);
    }

    #[tokio::test]
    async fn test_spawned_aggregator_collects_from_many_senders() {
        let (tx, handle) = spawn_aggregator(KEY, 4);

        let mut tasks = Vec::new();
        for n in 1..=4u32 {
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                tx.send(page(n, &[n as u64 * 10, n as u64 * 10 + 1]))
                    .await
                    .unwrap();
            }));
        }
        drop(tx);
        for task in tasks {
            task.await.unwrap();
        }

        let (items, stats) = handle.await.unwrap();
        assert_eq!(items.len(), 8);
        assert_eq!(stats.status, CategoryStatus::Complete);
        assert_eq!(stats.pages_fetched, 4);
    }
}
