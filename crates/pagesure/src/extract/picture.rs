//! Profile picture lookup.

use super::Selectors;
use scraper::Html;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// URL of the first SVG `image` element.
///
/// `xlink:href` is preferred over the SVG 2 `href`. The parser stores the
/// former as local name `href` in the XLink namespace.
pub(super) fn profile_picture_url(doc: &Html, selectors: &Selectors) -> Option<String> {
    let image = doc.select(&selectors.image).next()?;
    let element = image.value();
    let xlink = element
        .attrs
        .iter()
        .find(|(name, _)| &*name.ns == XLINK_NS && &*name.local == "href")
        .map(|(_, value)| &**value);
    [xlink, element.attr("href")]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
