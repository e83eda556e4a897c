//! The placeholder URL for items that have no real destination yet

use url::Url;

/// Stored for items whose page has not navigated anywhere.
pub const SENTINEL_URL: &str = "about:blank";

/// Blank strings are treated the same as [`SENTINEL_URL`].
pub fn is_sentinel_url(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url.eq_ignore_ascii_case(SENTINEL_URL)
}

/// `scheme://host[:port]` for http(s) URLs, `None` for everything else
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }

    let origin = parsed.origin();
    if origin.is_tuple() {
        Some(origin.ascii_serialization())
    } else {
        None
    }
}
