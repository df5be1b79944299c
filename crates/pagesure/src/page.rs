//! Page records and page identifiers.

use crate::category::{classify, CategoryKey};
use crate::extract::ExtractedPage;
use serde::{Deserialize, Serialize};

const PROFILE_PATH: &str = "profile.php";

/// Cached metadata about a scraped Facebook page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub title: Option<String>,
    pub verified: bool,
    pub profile_picture_url: Option<String>,
    /// Free-text category as shown on the page.
    pub category: Option<String>,
    /// Bucket derived from `category`.
    #[serde(default)]
    pub category_key: CategoryKey,
    /// The URL the record was scraped from.
    pub page_url: String,
}

impl PageRecord {
    /// Build a record from extracted metadata, deriving the category key.
    pub fn from_extraction(extracted: ExtractedPage, page_url: &str) -> Self {
        let category_key = classify(extracted.category.as_deref());
        Self {
            title: extracted.title,
            verified: extracted.verified,
            profile_picture_url: extracted.profile_picture_url,
            category: extracted.category,
            category_key,
            page_url: page_url.to_string(),
        }
    }

    /// Page identifier derived from `page_url`.
    pub fn page_id(&self) -> Result<String, PageError> {
        page_id_from_url(&self.page_url)
    }
}

/// Errors validating a page URL.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Missing URL")]
    MissingUrl,
    #[error("Invalid Facebook URL")]
    NotFacebook,
    #[error("Facebook URL has no page identifier")]
    EmptyPageId,
}

/// Whether `host` is `facebook.com` or one of its subdomains.
pub fn is_facebook_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "facebook.com" || host.ends_with(".facebook.com")
}

/// Derive the page identifier from a Facebook page URL.
///
/// The identifier is the path up to the query string; fragments and trailing
/// slashes are dropped, so `https://www.facebook.com/acme.shop/?ref=bookmarks`
/// maps to `acme.shop`. The host is matched without regard to case or port.
/// Numeric profiles (`profile.php?id=N`) map to `N`, the same id Facebook
/// serves them under at `facebook.com/N`.
pub fn page_id_from_url(url: &str) -> Result<String, PageError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(PageError::MissingUrl);
    }
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, rest) = rest.split_at(authority_end);
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);
    if !is_facebook_host(host) {
        return Err(PageError::NotFacebook);
    }

    let rest = rest.split('#').next().unwrap_or("");
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    let path = path.trim_matches('/');
    if path == PROFILE_PATH {
        let profile_id = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("id="))
            .filter(|id| !id.is_empty());
        if let Some(id) = profile_id {
            return Ok(id.to_string());
        }
    }
    if path.is_empty() {
        return Err(PageError::EmptyPageId);
    }
    Ok(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_strips_query_and_slash() {
        assert_eq!(
            page_id_from_url("https://www.facebook.com/acme.shop/?ref=bookmarks").unwrap(),
            "acme.shop"
        );
        assert_eq!(
            page_id_from_url("https://facebook.com/acme#about").unwrap(),
            "acme"
        );
    }

    #[test]
    fn test_page_id_ignores_host_case_and_port() {
        for url in [
            "https://WWW.FACEBOOK.COM/acme",
            "https://www.facebook.com:443/acme",
            "facebook.com/acme",
            "http://Facebook.com/acme/",
        ] {
            assert_eq!(page_id_from_url(url).unwrap(), "acme", "{url}");
        }
    }

    #[test]
    fn test_profile_php_keeps_numeric_id() {
        assert_eq!(
            page_id_from_url("  https://m.facebook.com/profile.php?id=123  ").unwrap(),
            "123"
        );
        assert_eq!(
            page_id_from_url("https://www.facebook.com/profile.php?sk=about&id=456#top").unwrap(),
            "456"
        );
        assert_ne!(
            page_id_from_url("https://www.facebook.com/profile.php?id=1").unwrap(),
            page_id_from_url("https://www.facebook.com/profile.php?id=2").unwrap()
        );
        assert_eq!(
            page_id_from_url("https://www.facebook.com/profile.php").unwrap(),
            "profile.php"
        );
    }

    #[test]
    fn test_page_id_keeps_nested_path() {
        assert_eq!(
            page_id_from_url("https://www.facebook.com/pages/Acme/42").unwrap(),
            "pages/Acme/42"
        );
    }

    #[test]
    fn test_page_id_errors() {
        assert_eq!(page_id_from_url(""), Err(PageError::MissingUrl));
        assert_eq!(page_id_from_url("   "), Err(PageError::MissingUrl));
        assert_eq!(
            page_id_from_url("https://example.com/acme"),
            Err(PageError::NotFacebook)
        );
        assert_eq!(
            page_id_from_url("https://example.com/facebook.com/acme"),
            Err(PageError::NotFacebook)
        );
        assert_eq!(
            page_id_from_url("https://www.facebook.com/?ref=home"),
            Err(PageError::EmptyPageId)
        );
        assert_eq!(
            page_id_from_url("https://facebook.com"),
            Err(PageError::EmptyPageId)
        );
    }

    #[test]
    fn test_from_extraction_derives_key() {
        let extracted = ExtractedPage {
            title: Some("Chez Paul".into()),
            verified: true,
            profile_picture_url: Some("https://cdn.example/p.jpg".into()),
            category: Some("Restaurant français".into()),
        };
        let record =
            PageRecord::from_extraction(extracted, "https://www.facebook.com/chezpaul");
        assert_eq!(record.category_key, CategoryKey::Restaurant);
        assert_eq!(record.page_id().unwrap(), "chezpaul");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["categoryKey"], "restaurant");
        assert_eq!(json["profilePictureUrl"], "https://cdn.example/p.jpg");
        assert_eq!(json["pageUrl"], "https://www.facebook.com/chezpaul");
    }
}
