//! Bounded pool of browser contexts for scraping.

pub mod manager;

pub use manager::{ContextHandle, PoolStatus, ScrapePool};
