//! Pure per-entry planning: what to write and where, decided before any I/O.

use url::Url;

use crate::download::filename::{UNNAMED, numbered_image_name, sanitize_name};
use crate::extract::{HtmlDocument, PageMarkup, extract};
use crate::output::MANIFEST_FILE_NAME;

/// One image to download and the file name it is saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTarget {
    /// Absolute image URL.
    pub url: Url,
    /// File name inside the entry directory (`01.jpg`, ...).
    pub file_name: String,
}

/// Everything the pipeline materializes for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPlan {
    /// Output directory name, derived from the page heading.
    pub dir_name: String,
    /// Description text for `descrizione.txt`.
    pub description: String,
    /// Images in download order, numbered by candidate position.
    pub images: Vec<ImageTarget>,
}

impl EntryPlan {
    /// Description length in characters.
    #[must_use]
    pub fn description_chars(&self) -> usize {
        self.description.chars().count()
    }
}

/// Plans one entry from its detail-page markup.
///
/// The directory name comes from the page heading when the page has one
/// (a blank heading sanitizes to [`UNNAMED`]) and from `fallback_name` (the
/// catalog display name) otherwise. A name that would shadow the manifest
/// at the tree root is replaced by [`UNNAMED`].
pub fn plan_entry(
    markup: &impl PageMarkup,
    page_url: &Url,
    fallback_name: &str,
    image_cap: usize,
) -> EntryPlan {
    let dir_name = entry_dir_name(
        markup
            .heading()
            .as_deref()
            .unwrap_or(fallback_name),
    );

    let extraction = extract(markup, page_url, image_cap);
    let images = extraction
        .image_urls
        .into_iter()
        .enumerate()
        .map(|(index, url)| ImageTarget {
            file_name: numbered_image_name(index + 1, &url),
            url,
        })
        .collect();

    EntryPlan {
        dir_name,
        description: extraction.description,
        images,
    }
}

fn entry_dir_name(text: &str) -> String {
    let name = sanitize_name(text);
    if name.eq_ignore_ascii_case(MANIFEST_FILE_NAME) {
        UNNAMED.to_string()
    } else {
        name
    }
}

/// Parses `source` and plans the entry; the parsed document is dropped here.
pub(crate) fn plan_from_source(
    source: &str,
    page_url: &Url,
    fallback_name: &str,
    image_cap: usize,
) -> EntryPlan {
    plan_entry(&HtmlDocument::parse(source), page_url, fallback_name, image_cap)
}
