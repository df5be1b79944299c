//! Rendered-page snapshot handed from the browser to the extractor.

use serde::{Deserialize, Serialize};

/// A viewport bounding box, as reported by `getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

/// The rendered document plus the layout facts the badge heuristic needs.
///
/// Geometry cannot be recovered from markup alone, so the browser reports
/// the first `h1` box and the boxes of every verification badge icon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// Serialized `document.documentElement`, NFC-normalized.
    pub html: String,
    #[serde(default)]
    pub title_rect: Option<Rect>,
    #[serde(default)]
    pub badge_rects: Vec<Rect>,
}

impl PageSnapshot {
    /// Snapshot of markup with no layout information.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }
}
