//! Page metadata extraction from a rendered Facebook page.
//!
//! Facebook serves obfuscated, frequently changing markup, so each field is
//! located through a chain of fallback strategies rather than fixed
//! selectors:
//!
//! - **title**: first `h1`, minus any "verified" suffix
//! - **verified**: badge icon inside the title container, else a badge icon
//!   laid out next to the title
//! - **profile picture**: `href` of the first SVG `image`
//! - **category**: intro span, then title siblings, then keyword scan
//!
//! All selectors and patterns are compiled once in [`Extractor::new`].

mod badge;
mod category;
mod picture;
mod text;
mod title;

use crate::snapshot::PageSnapshot;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

pub use badge::BADGE_SELECTOR;

/// Fields pulled out of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub verified: bool,
    pub profile_picture_url: Option<String>,
    pub category: Option<String>,
}

/// Errors building an [`Extractor`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid selector {0}")]
    Selector(String),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Compiled CSS selectors.
pub(crate) struct Selectors {
    pub heading: Selector,
    pub badge: Selector,
    pub image: Selector,
    pub span: Selector,
    pub strong: Selector,
    pub span_or_div: Selector,
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{css:?}: {e:?}")))
}

impl Selectors {
    fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            heading: selector("h1")?,
            badge: selector(badge::BADGE_SELECTOR)?,
            image: selector("image")?,
            span: selector("span")?,
            strong: selector("strong")?,
            span_or_div: selector("span, div")?,
        })
    }
}

/// Compiled regular expressions.
pub(crate) struct Patterns {
    pub title_suffix: Regex,
    pub apostrophe: Regex,
}

impl Patterns {
    fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            title_suffix: Regex::new(title::VERIFIED_SUFFIX)?,
            apostrophe: Regex::new(text::MANGLED_APOSTROPHE)?,
        })
    }
}

/// Runs the extraction heuristic over page snapshots.
pub struct Extractor {
    selectors: Selectors,
    patterns: Patterns,
}

impl Extractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            selectors: Selectors::new()?,
            patterns: Patterns::new()?,
        })
    }

    /// Extract page metadata from a snapshot.
    ///
    /// Never fails: a field that no strategy can find is left empty.
    pub fn extract(&self, snapshot: &PageSnapshot) -> ExtractedPage {
        let doc = Html::parse_document(&snapshot.html);
        let heading = doc.select(&self.selectors.heading).next();

        let title = title::page_title(heading, &self.patterns);
        let verified = badge::is_verified(heading, snapshot, &self.selectors);
        let profile_picture_url = picture::profile_picture_url(&doc, &self.selectors);
        let category = category::page_category(&doc, heading, &self.selectors, &self.patterns);

        tracing::debug!(
            title = title.as_deref().unwrap_or(""),
            verified,
            has_picture = profile_picture_url.is_some(),
            category = category.as_deref().unwrap_or(""),
            "extracted page metadata"
        );

        ExtractedPage {
            title,
            verified,
            profile_picture_url,
            category,
        }
    }
}
