//! URL recovery for items stuck on the blank placeholder
//!
//! Older builds could persist an item with `about:blank` while its title
//! still named the real page. Such items are repaired from the title: the
//! first keyword found in it picks the site, otherwise the fallback homepage
//! is used.

use url::Url;

use tessera_items::Item;

use crate::{NavigationError, Result};

pub const DEFAULT_FALLBACK_HOMEPAGE: &str = "https://www.google.com";

/// Titles engines and the shell give pages that have not loaded anything
pub const GENERIC_TITLES: [&str; 3] = ["new tab", "untitled", "about:blank"];

/// Title keyword → canonical site. Checked in order, so product names that
/// contain a broader brand come before it.
const KEYWORD_TABLE: &[(&str, &str)] = &[
    ("gmail", "https://mail.google.com"),
    ("google docs", "https://docs.google.com"),
    ("google sheets", "https://sheets.google.com"),
    ("google drive", "https://drive.google.com"),
    ("google calendar", "https://calendar.google.com"),
    ("google maps", "https://maps.google.com"),
    ("youtube music", "https://music.youtube.com"),
    ("youtube", "https://www.youtube.com"),
    ("google", "https://www.google.com"),
    ("github", "https://github.com"),
    ("gitlab", "https://gitlab.com"),
    ("stack overflow", "https://stackoverflow.com"),
    ("stackoverflow", "https://stackoverflow.com"),
    ("reddit", "https://www.reddit.com"),
    ("wikipedia", "https://www.wikipedia.org"),
    ("twitter", "https://x.com"),
    ("facebook", "https://www.facebook.com"),
    ("instagram", "https://www.instagram.com"),
    ("linkedin", "https://www.linkedin.com"),
    ("outlook", "https://outlook.live.com"),
    ("notion", "https://www.notion.so"),
    ("slack", "https://app.slack.com"),
    ("discord", "https://discord.com"),
    ("figma", "https://www.figma.com"),
    ("spotify", "https://open.spotify.com"),
    ("netflix", "https://www.netflix.com"),
    ("amazon", "https://www.amazon.com"),
    ("chatgpt", "https://chatgpt.com"),
];

/// Whether a title carries no information about the page
pub fn is_generic_title(title: &str) -> bool {
    let title = title.trim();
    title.is_empty()
        || GENERIC_TITLES
            .iter()
            .any(|generic| title.eq_ignore_ascii_case(generic))
}

#[derive(Debug, Clone)]
pub struct UrlRecovery {
    fallback_homepage: String,
}

impl UrlRecovery {
    pub fn new() -> Self {
        Self {
            fallback_homepage: DEFAULT_FALLBACK_HOMEPAGE.to_string(),
        }
    }

    pub fn with_fallback(homepage: &str) -> Result<Self> {
        let parsed =
            Url::parse(homepage).map_err(|_| NavigationError::InvalidHomepage(homepage.into()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NavigationError::InvalidHomepage(homepage.to_string()));
        }

        Ok(Self {
            fallback_homepage: homepage.to_string(),
        })
    }

    pub fn fallback_homepage(&self) -> &str {
        &self.fallback_homepage
    }

    /// Site named by the title, if any keyword matches
    pub fn keyword_match(title: &str) -> Option<&'static str> {
        let title = title.to_lowercase();
        KEYWORD_TABLE
            .iter()
            .find(|(keyword, _)| title.contains(keyword))
            .map(|(_, url)| *url)
    }

    /// Best guess for a page with this title
    pub fn recover_url(&self, title: &str) -> String {
        Self::keyword_match(title)
            .map(str::to_string)
            .unwrap_or_else(|| self.fallback_homepage.clone())
    }

    /// Placeholder URL with a title worth reading
    pub fn needs_recovery(item: &Item) -> bool {
        item.has_sentinel_url() && !is_generic_title(item.title())
    }

    /// Repaired copy of `item`, or `None` if it does not need repair
    pub fn recover(&self, item: &Item) -> Option<Item> {
        if !Self::needs_recovery(item) {
            return None;
        }

        let url = self.recover_url(item.title());
        tracing::info!(
            session_id = %item.key(),
            title = %item.title(),
            url = %url,
            "Recovered placeholder URL from title"
        );

        let mut repaired = item.clone();
        repaired.set_url(url);
        Some(repaired)
    }
}

impl Default for UrlRecovery {
    fn default() -> Self {
        Self::new()
    }
}
