//! Shared User-Agent string for every request the scraper issues.
//!
//! The catalog site serves its gallery markup only to browser-like clients,
//! so the default identifies as a desktop browser.

/// Browser User-Agent sent with every page, probe and image request.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122 Safari/537.36";

/// Default User-Agent for the shared HTTP client.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}
