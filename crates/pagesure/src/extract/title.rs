//! Page title lookup.

use super::text::full_text;
use super::Patterns;
use scraper::ElementRef;

/// Trailing "verified" label that Facebook renders inside the heading,
/// optionally preceded by a dash or pipe separator.
pub(super) const VERIFIED_SUFFIX: &str =
    r"(?i)\s*[-–—|]*\s*(?:Compte vérifié|Verified account|Page vérifiée|Page verified)$";

/// Title text of the page heading with the verified label removed.
pub(super) fn page_title(heading: Option<ElementRef<'_>>, patterns: &Patterns) -> Option<String> {
    let raw = full_text(heading?);
    let stripped = patterns.title_suffix.replace(raw.trim(), "");
    let title = stripped.trim();
    (!title.is_empty()).then(|| title.to_string())
}
