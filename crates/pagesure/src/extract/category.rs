//! Free-text category lookup.
//!
//! Three passes, first hit wins:
//!
//! 1. the intro line `<span><strong>Page</strong> · Category</span>`
//! 2. one of the three elements following the title container
//! 3. any short `span`/`div` mentioning a business-type keyword

use super::text::{clean_category, full_text};
use super::{Patterns, Selectors};
use scraper::{ElementRef, Html};
use tracing::trace;

const INTRO_LABEL: &str = "Page";
const INTRO_SEPARATOR: char = '·';

/// How many elements after the title container are inspected.
const SIBLING_WINDOW: usize = 3;

/// Keywords that mark text as a probable category.
const CATEGORY_KEYWORDS: &[&str] = &[
    "business",
    "shop",
    "store",
    "company",
    "brand",
    "service",
    "organization",
    "community",
    "artist",
    "public figure",
    "restaurant",
    "cafe",
    "clothing",
    "fashion",
    "boutique",
    "marque",
    "vêtements",
];

/// Longest text the keyword pass accepts. Layout containers hold whole
/// sections of the page and would otherwise match first.
const KEYWORD_MAX_CHARS: usize = 80;

pub(super) fn page_category(
    doc: &Html,
    heading: Option<ElementRef<'_>>,
    selectors: &Selectors,
    patterns: &Patterns,
) -> Option<String> {
    if let Some(category) = from_intro(doc, selectors, patterns) {
        trace!(pass = "intro", %category, "category found");
        return Some(category);
    }
    if let Some(category) = heading.and_then(|h| from_heading_siblings(h, patterns)) {
        trace!(pass = "siblings", %category, "category found");
        return Some(category);
    }
    let category = from_keywords(doc, selectors, patterns);
    if let Some(category) = &category {
        trace!(pass = "keywords", %category, "category found");
    }
    category
}

/// Pass 1: the span whose `strong` reads "Page" and which carries the
/// `Page · Category` separator.
fn from_intro(doc: &Html, selectors: &Selectors, patterns: &Patterns) -> Option<String> {
    let span = doc.select(&selectors.span).find(|span| {
        let labelled = span
            .select(&selectors.strong)
            .next()
            .is_some_and(|strong| full_text(strong).trim() == INTRO_LABEL);
        labelled && full_text(*span).contains(INTRO_SEPARATOR)
    })?;
    let raw = full_text(span);
    let part = raw.split(INTRO_SEPARATOR).nth(1)?;
    clean_category(part, &patterns.apostrophe)
}

/// Pass 2: the first short, digit-free element after the title container.
fn from_heading_siblings(heading: ElementRef<'_>, patterns: &Patterns) -> Option<String> {
    let container = heading.parent().and_then(ElementRef::wrap)?;
    container
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take(SIBLING_WINDOW)
        .find_map(|sibling| {
            let text = full_text(sibling);
            let text = text.trim();
            let len = text.chars().count();
            let plausible = (3..40).contains(&len) && !text.chars().any(|c| c.is_ascii_digit());
            if plausible {
                clean_category(text, &patterns.apostrophe)
            } else {
                None
            }
        })
}

/// Pass 3: the first short `span`/`div` containing a category keyword.
fn from_keywords(doc: &Html, selectors: &Selectors, patterns: &Patterns) -> Option<String> {
    doc.select(&selectors.span_or_div).find_map(|el| {
        let text = full_text(el);
        let text = text.trim();
        if text.is_empty() || text.chars().count() > KEYWORD_MAX_CHARS {
            return None;
        }
        let lowered = text.to_lowercase();
        if CATEGORY_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            clean_category(text, &patterns.apostrophe)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category_of(html: &str) -> Option<String> {
        let selectors = Selectors::new().unwrap();
        let patterns = Patterns::new().unwrap();
        let doc = Html::parse_document(html);
        let heading = doc.select(&selectors.heading).next();
        page_category(&doc, heading, &selectors, &patterns)
    }

    #[test]
    fn test_intro_span() {
        let html = r#"<div><h1>Acme</h1></div>
            <div>4,2 K followers</div>
            <span><strong>Page</strong> · Agence dâ€™assurance</span>"#;
        assert_eq!(category_of(html).as_deref(), Some("Agence d'assurance"));
    }

    #[test]
    fn test_intro_span_takes_segment_after_first_separator() {
        let html = r#"<span><strong>Page</strong> · Restaurant · Paris, France</span>"#;
        assert_eq!(category_of(html).as_deref(), Some("Restaurant"));
    }

    #[test]
    fn test_intro_requires_page_label() {
        // No "Page" label, so the sibling pass decides.
        let html = r#"<div><div><h1>Acme</h1></div><div>Clothing store</div></div>
            <span><strong>Profil</strong> · Artiste</span>"#;
        assert_eq!(category_of(html).as_deref(), Some("Clothing store"));
    }

    #[test]
    fn test_heading_siblings_skip_numbers_and_long_text() {
        let html = r#"<div>
            <div class="name"><h1>Acme</h1></div>
            <div>12 K followers</div>
            <div>This page has a description that is much too long to be a category</div>
            <div>Pâtisserie</div>
        </div>"#;
        assert_eq!(category_of(html).as_deref(), Some("Pâtisserie"));
    }

    #[test]
    fn test_heading_siblings_window_is_three() {
        let html = r#"<div>
            <div class="name"><h1>Acme</h1></div>
            <div>1</div><div>2</div><div>3</div>
            <div>Pâtisserie</div>
        </div>"#;
        assert_eq!(category_of(html), None);
    }

    #[test]
    fn test_keyword_fallback() {
        let html = r#"<main>
            <h1>Acme</h1>
            <section><span>Welcome!</span><span>Local business</span></section>
        </main>"#;
        assert_eq!(category_of(html).as_deref(), Some("Local business"));
    }

    #[test]
    fn test_keyword_fallback_skips_large_containers() {
        let html = r#"<div>
            <p>Everything you ever wanted to know about our neighbourhood, our people and our story.</p>
            <span>Marque de vêtements</span>
        </div>"#;
        assert_eq!(category_of(html).as_deref(), Some("Marque de vêtements"));
    }

    #[test]
    fn test_keyword_fallback_skips_long_sentences() {
        let html = r#"<section>
            <span>Our family restaurant serves seasonal dishes in the heart of the old town, every single day.</span>
            <span>Fashion</span>
        </section>"#;
        assert_eq!(category_of(html).as_deref(), Some("Fashion"));
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(category_of("<div><h1>Acme</h1></div><p>2024</p>"), None);
    }
}
