//! Detail-page URL classification.

use url::Url;

use crate::config::SiteLayout;

/// Returns true iff `candidate` is a catalog detail page of `site`.
///
/// A detail URL is on the canonical host (port included), carries no query
/// string or fragment, sits under the catalog prefix with exactly one more
/// non-empty path segment than the prefix, and its final segment has no `.`
/// (file-like paths are excluded). Unparseable input is never a detail URL.
#[must_use]
pub fn is_detail_url(candidate: &str, site: &SiteLayout) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };

    let root = site.site_root();
    if url.host_str() != root.host_str()
        || url.port_or_known_default() != root.port_or_known_default()
    {
        return false;
    }
    if url.query().is_some_and(|q| !q.is_empty())
        || url.fragment().is_some_and(|f| !f.is_empty())
    {
        return false;
    }

    let path = url.path();
    if !path.starts_with(site.detail_prefix()) {
        return false;
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let expected = site
        .detail_prefix()
        .split('/')
        .filter(|s| !s.is_empty())
        .count()
        + 1;
    if segments.len() != expected {
        return false;
    }

    segments.last().is_some_and(|slug| !slug.contains('.'))
}

/// Returns the slug (last non-empty path segment) of a detail URL.
#[must_use]
pub fn slug_of(url: &Url) -> Option<String> {
    url.path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
