//! Filesystem-safe naming for entry directories and image files.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::constants::{DEFAULT_IMAGE_EXTENSION, MAX_EXTENSION_LEN};

/// Maximum length, in characters, of a sanitized name.
pub const MAX_NAME_CHARS: usize = 80;

/// Name used when sanitization leaves nothing usable.
pub const UNNAMED: &str = "senza_nome";

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

#[allow(clippy::expect_used)]
static DISALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^0-9A-Za-zÀ-ÖØ-öø-ÿ _\-.()]").expect("disallowed-chars regex is valid")
});

/// Sanitizes free text (a page heading or slug) into a directory-safe name.
///
/// Whitespace runs collapse to a single space, path separators become `-`,
/// anything outside letters (Latin-1 accents included), digits, space,
/// `_ - . ( )` is dropped, and the result is cut to [`MAX_NAME_CHARS`].
/// Returns [`UNNAMED`] when nothing usable remains.
#[must_use]
pub fn sanitize_name(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    let separators_replaced = collapsed.replace(['/', '\\'], "-");
    let filtered = DISALLOWED_CHARS.replace_all(&separators_replaced, "");
    let truncated: String = filtered.chars().take(MAX_NAME_CHARS).collect();
    let cleaned = collapse_whitespace(&truncated);

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        UNNAMED.to_string()
    } else {
        cleaned
    }
}

/// Collapses every whitespace run to one space and trims both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Infers the file extension (dot included) for an image URL.
///
/// Uses the suffix after the last dot of the final path segment when it is
/// short enough, otherwise [`DEFAULT_IMAGE_EXTENSION`].
#[must_use]
pub fn image_extension(url: &Url) -> String {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match last_segment.rfind('.') {
        Some(dot) if dot > 0 => {
            let ext = &last_segment[dot..];
            let len = ext.chars().count();
            if len > 1 && len <= MAX_EXTENSION_LEN {
                ext.to_string()
            } else {
                DEFAULT_IMAGE_EXTENSION.to_string()
            }
        }
        _ => DEFAULT_IMAGE_EXTENSION.to_string(),
    }
}

/// Builds the sequential file name (`01.jpg`, `02.png`, ...) for the n-th image.
#[must_use]
pub fn numbered_image_name(position: usize, url: &Url) -> String {
    format!("{position:02}{}", image_extension(url))
}
