//! Verification badge detection.

use super::Selectors;
use crate::snapshot::{PageSnapshot, Rect};
use scraper::ElementRef;

/// Badge icons carry their accessible label in a `title` attribute.
pub const BADGE_SELECTOR: &str =
    r#"svg[title*="Verified account"], svg[title*="Compte vérifié"]"#;

/// Maximum distance, in CSS pixels, between a badge and the title edge.
const PROXIMITY_PX: f64 = 50.0;

/// Whether the page shows a verification badge next to its title.
pub(super) fn is_verified(
    heading: Option<ElementRef<'_>>,
    snapshot: &PageSnapshot,
    selectors: &Selectors,
) -> bool {
    let Some(heading) = heading else {
        return false;
    };

    let in_container = heading
        .parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|container| container.select(&selectors.badge).next().is_some());
    if in_container {
        return true;
    }

    snapshot
        .title_rect
        .is_some_and(|title| snapshot.badge_rects.iter().any(|b| beside(&title, b)))
}

/// Badge top aligned with the title top and badge left edge at the title's
/// right edge, both within [`PROXIMITY_PX`].
fn beside(title: &Rect, badge: &Rect) -> bool {
    (badge.top - title.top).abs() < PROXIMITY_PX && (badge.left - title.right).abs() < PROXIMITY_PX
}
