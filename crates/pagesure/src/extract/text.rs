//! Text helpers shared by the extraction passes.

use regex::Regex;
use scraper::ElementRef;

/// `d’` / `d'` with the apostrophe double-encoded (`dâ€™`) or curly.
pub(super) const MANGLED_APOSTROPHE: &str = r"(?i)\b(d)(?:â€™|’)";

/// Concatenation of every descendant text node.
pub(super) fn full_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Normalize a category string: repair apostrophes, straighten quotes,
/// collapse whitespace. Blank input yields `None`.
pub(super) fn clean_category(raw: &str, apostrophe: &Regex) -> Option<String> {
    let repaired = apostrophe.replace_all(raw, "${1}'");
    let straightened: String = repaired
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' => '\'',
            other => other,
        })
        .collect();
    let collapsed = straightened.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
