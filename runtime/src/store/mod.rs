//! Persistence for page records and reviews.

pub mod sqlite;

pub use sqlite::SqliteStore;

use anyhow::Result;
use pagesure::{CategoryKey, PageRecord, Review};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A page record with its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPage {
    pub id: String,
    #[serde(flatten)]
    pub record: PageRecord,
}

/// Page records keyed by page id.
pub trait PageStore: Send + Sync {
    /// Insert `record` unless `id` is already stored; returns the stored record.
    fn insert_page_if_absent(&self, id: &str, record: &PageRecord) -> Result<StoredPage>;

    fn get_page(&self, id: &str) -> Result<Option<StoredPage>>;

    /// All pages, oldest first.
    fn list_pages(&self) -> Result<Vec<StoredPage>>;

    fn pages_by_category(&self, key: CategoryKey) -> Result<Vec<StoredPage>>;

    /// Stored pages per bucket; buckets without pages are absent.
    fn count_by_category(&self) -> Result<HashMap<CategoryKey, usize>>;
}

/// Reviews, queried by page and by author. Each author reviews a page at
/// most once.
pub trait ReviewStore: Send + Sync {
    /// Store a new review; returns `false` when its author already reviewed
    /// the page.
    fn insert_review(&self, review: &Review) -> Result<bool>;

    fn get_review(&self, id: &str) -> Result<Option<Review>>;

    /// Reviews of a page, newest first.
    fn reviews_for_page(&self, page_id: &str) -> Result<Vec<Review>>;

    /// Reviews written by a user, newest first.
    fn reviews_by_user(&self, user_id: &str) -> Result<Vec<Review>>;

    /// Read, change and write back one review atomically.
    ///
    /// Returns `None` when no review has this id.
    fn modify_review(
        &self,
        id: &str,
        change: &mut dyn FnMut(&mut Review) -> Result<()>,
    ) -> Result<Option<Review>>;

    /// Returns whether a review was deleted.
    fn delete_review(&self, id: &str) -> Result<bool>;
}
