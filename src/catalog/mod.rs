//! Catalog discovery: listing page to sorted, slug-unique entries.
//!
//! # Example
//!
//! ```no_run
//! use kitchen_scraper::{HttpClient, SiteLayout, discover};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let client = HttpClient::new();
//! let entries = discover(&client, &SiteLayout::default(), Duration::from_millis(20)).await;
//! for entry in &entries {
//!     println!("{} -> {}", entry.display_name, entry.url);
//! }
//! # }
//! ```

mod classifier;

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::SiteLayout;
use crate::download::HttpClient;
use crate::download::filename::sanitize_name;
use crate::extract::{HtmlDocument, PageMarkup};

pub use classifier::{is_detail_url, slug_of};

/// One discoverable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Last path segment of the detail URL; the discovery identity key.
    pub slug: String,
    /// Sanitized page heading, or the sanitized slug when unavailable.
    pub display_name: String,
    /// Canonical detail-page URL.
    pub url: Url,
}

/// Immutable snapshot of the catalog handed to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Wraps discovered entries, keeping their order.
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Builds a snapshot from display-name/URL pairs.
    ///
    /// Slugs are derived from the URLs; pairs whose URL has no path segment
    /// use the display name as slug.
    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Url)>,
        S: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(name, url)| {
                let display_name = name.into();
                let slug = slug_of(&url).unwrap_or_else(|| display_name.clone());
                CatalogEntry {
                    slug,
                    display_name,
                    url,
                }
            })
            .collect();
        Self { entries }
    }

    /// Entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Display names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.display_name.as_str())
    }

    /// URL for a display name. With duplicate names the later entry wins.
    #[must_use]
    pub fn lookup(&self, display_name: &str) -> Option<&Url> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.display_name == display_name)
            .map(|e| &e.url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Discovers the catalog of `site`.
///
/// Never fails: an unreachable listing yields an empty list and an
/// unreachable detail page falls back to its slug for the display name.
/// Detail fetches are separated by `pause`. The result is sorted
/// case-insensitively by display name.
#[instrument(skip(client, site), fields(listing = %site.listing_url()))]
pub async fn discover(client: &HttpClient, site: &SiteLayout, pause: Duration) -> Vec<CatalogEntry> {
    let listing_url = site.listing_url();
    let listing = match client.fetch_page(listing_url.as_str()).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "catalog listing unavailable");
            return Vec::new();
        }
    };

    let candidates = detail_candidates(&listing, listing_url, site);
    debug!(count = candidates.len(), "detail candidates");

    let mut entries = Vec::with_capacity(candidates.len());
    for (index, (slug, url)) in candidates.into_iter().enumerate() {
        if index > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        let heading = match client.fetch_page(url.as_str()).await {
            Ok(body) => heading_of(&body),
            Err(e) => {
                debug!(url = %url, error = %e, "detail page unavailable, using slug");
                None
            }
        };
        let display_name = heading.map_or_else(|| sanitize_name(&slug), |h| sanitize_name(&h));
        entries.push(CatalogEntry {
            slug,
            display_name,
            url,
        });
    }

    entries.sort_by_cached_key(|e| e.display_name.to_lowercase());
    info!(entries = entries.len(), "catalog discovered");
    entries
}

/// Detail links on the listing page, unique by slug, first occurrence kept.
fn detail_candidates(source: &str, listing_url: &Url, site: &SiteLayout) -> Vec<(String, Url)> {
    let links = HtmlDocument::parse(source).item_links();
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for href in links {
        let Ok(absolute) = listing_url.join(&href) else {
            continue;
        };
        if !is_detail_url(absolute.as_str(), site) {
            continue;
        }
        let Some(slug) = slug_of(&absolute) else {
            continue;
        };
        if seen.insert(slug.clone()) {
            candidates.push((slug, absolute));
        }
    }

    candidates
}

fn heading_of(source: &str) -> Option<String> {
    HtmlDocument::parse(source).heading()
}
