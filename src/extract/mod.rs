//! Description and gallery extraction from detail pages.
//!
//! Page access goes through the small [`PageMarkup`] capability so the
//! extraction rules (ordering, de-duplication, the image cap) do not depend
//! on any markup library. [`HtmlDocument`] implements it for the real site;
//! tests substitute fixed structures.

mod html;

use std::collections::HashSet;

use tracing::{debug, instrument};
use url::Url;

use crate::download::{FetchError, HttpClient};

pub use html::HtmlDocument;

/// Image path suffixes accepted as gallery images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

/// Separator placed between description paragraphs.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Read access to the parts of a catalog page the scraper relies on.
pub trait PageMarkup {
    /// Text of the first top-level heading, if the page has one (empty when
    /// the heading holds no text).
    fn heading(&self) -> Option<String>;

    /// Text of every paragraph inside the first text-and-link block, in
    /// document order (possibly empty strings). Empty when the block is absent.
    fn description_paragraphs(&self) -> Vec<String>;

    /// `href` of every item link inside the media wrappers, in document order.
    fn image_anchors(&self) -> Vec<String>;

    /// `href` of every item link anywhere on the page, in document order.
    fn item_links(&self) -> Vec<String>;
}

/// Description and ordered gallery of one detail page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractionResult {
    /// Non-empty paragraphs joined by a blank line.
    pub description: String,
    /// Absolute image URLs: unique, in document order, at most the cap.
    pub image_urls: Vec<Url>,
}

/// Joins non-empty paragraphs with a blank line.
#[must_use]
pub fn build_description(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}

/// Returns true when the URL path ends with a recognized image extension.
#[must_use]
pub fn has_image_extension(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Resolves gallery hrefs against `page_url` and keeps at most `cap` images.
///
/// A URL is kept when it has an image extension and its absolute form was
/// not seen earlier on the page. Collection stops as soon as `cap` URLs are
/// kept; later candidates are never considered.
pub fn select_image_urls<I, S>(hrefs: I, page_url: &Url, cap: usize) -> Vec<Url>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for href in hrefs {
        if ordered.len() >= cap {
            break;
        }
        let href = href.as_ref();
        if href.is_empty() {
            continue;
        }
        let Ok(absolute) = page_url.join(href) else {
            debug!(href, "unresolvable image href");
            continue;
        };
        if has_image_extension(&absolute) && seen.insert(absolute.as_str().to_string()) {
            ordered.push(absolute);
        }
    }

    ordered
}

/// Extracts description and gallery from already-parsed markup.
pub fn extract(markup: &impl PageMarkup, page_url: &Url, image_cap: usize) -> ExtractionResult {
    ExtractionResult {
        description: build_description(&markup.description_paragraphs()),
        image_urls: select_image_urls(markup.image_anchors(), page_url, image_cap),
    }
}

/// Fetches a detail page and extracts its description and gallery.
///
/// # Errors
///
/// Returns the [`FetchError`] when the page cannot be fetched. A missing
/// description block or gallery is not an error.
#[instrument(skip(client), fields(url = %page_url))]
pub async fn extract_page(
    client: &HttpClient,
    page_url: &Url,
    image_cap: usize,
) -> Result<ExtractionResult, FetchError> {
    let body = client.fetch_page(page_url.as_str()).await?;
    Ok(extract_from_source(&body, page_url, image_cap))
}

fn extract_from_source(source: &str, page_url: &Url, image_cap: usize) -> ExtractionResult {
    extract(&HtmlDocument::parse(source), page_url, image_cap)
}
