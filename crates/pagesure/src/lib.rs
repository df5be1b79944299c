//! PageSure core library.
//!
//! Domain types and pure logic shared by the runtime: page and review
//! records, the ten category buckets, review statistics, and the heuristic
//! that pulls page metadata out of a rendered Facebook page snapshot.

pub mod category;
pub mod extract;
pub mod page;
pub mod review;
pub mod snapshot;

pub use category::{Category, CategoryError, CategoryKey};
pub use extract::{ExtractError, ExtractedPage, Extractor};
pub use page::{is_facebook_host, page_id_from_url, PageError, PageRecord};
pub use review::{
    sort_newest_first, NewReview, RatingBadge, Review, ReviewError, ReviewStats, ReviewUpdate,
};
pub use snapshot::{PageSnapshot, Rect};
