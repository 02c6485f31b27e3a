//! [`PageMarkup`] over real catalog markup, backed by `scraper`.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::PageMarkup;
use crate::download::filename::collapse_whitespace;

#[allow(clippy::expect_used)]
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("heading selector is valid"));

#[allow(clippy::expect_used)]
static TEXT_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".gb-text-and-link").expect("text block selector is valid"));

#[allow(clippy::expect_used)]
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("paragraph selector is valid"));

#[allow(clippy::expect_used)]
static MEDIA_WRAPPER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".gb-media-wrapper").expect("media selector is valid"));

#[allow(clippy::expect_used)]
static ITEM_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.gb-item-link").expect("item link selector is valid"));

/// A parsed listing or detail page.
///
/// `scraper::Html` is not `Send`; parse, query and drop it without holding
/// it across an `.await`.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses a full HTML document. Malformed markup never fails.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument").finish_non_exhaustive()
    }
}

/// Text of an element: each text node trimmed, empty ones dropped, joined by a space.
fn element_text(element: ElementRef<'_>) -> String {
    let joined = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// Heading text: each text node trimmed and concatenated without a separator,
/// so `Cucina<br>Kali` reads `CucinaKali`.
fn heading_text(element: ElementRef<'_>) -> String {
    let joined: String = element.text().map(str::trim).collect();
    collapse_whitespace(&joined)
}

fn hrefs<'a>(links: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    links
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

impl PageMarkup for HtmlDocument {
    fn heading(&self) -> Option<String> {
        self.html.select(&HEADING).next().map(heading_text)
    }

    fn description_paragraphs(&self) -> Vec<String> {
        let Some(block) = self.html.select(&TEXT_BLOCK).next() else {
            return Vec::new();
        };
        block.select(&PARAGRAPH).map(element_text).collect()
    }

    fn image_anchors(&self) -> Vec<String> {
        self.html
            .select(&MEDIA_WRAPPER)
            .flat_map(|wrapper| hrefs(wrapper.select(&ITEM_LINK)))
            .collect()
    }

    fn item_links(&self) -> Vec<String> {
        hrefs(self.html.select(&ITEM_LINK))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"<!doctype html>
<html><body>
  <h1>  Kali
     <span>Luxe</span> </h1>
  <div class="gb-text-and-link">
    <p>First   line.</p>
    <p>   </p>
    <p>Second <strong>bold</strong> line.</p>
  </div>
  <div class="gb-text-and-link"><p>Ignored block.</p></div>
  <div class="gb-media-wrapper">
    <a class="gb-item-link" href="/img/one.jpg">one</a>
    <a class="other" href="/img/skip.jpg">skip</a>
    <a class="gb-item-link" href="/img/two.png">two</a>
  </div>
  <a class="gb-item-link" href="/it/cucine/loose">outside wrapper</a>
  <div class="gb-media-wrapper">
    <a class="gb-item-link">no href</a>
    <a class="gb-item-link" href="three.webp">three</a>
  </div>
</body></html>"#;

    #[test]
    fn test_heading_text_nodes_joined_without_separator() {
        let doc = HtmlDocument::parse(DETAIL);
        assert_eq!(doc.heading().as_deref(), Some("KaliLuxe"));

        let doc = HtmlDocument::parse("<h1>Cucina<br>Kali</h1>");
        assert_eq!(doc.heading().as_deref(), Some("CucinaKali"));

        let doc = HtmlDocument::parse("<h1>Cucina Kali  Luxe</h1>");
        assert_eq!(doc.heading().as_deref(), Some("Cucina Kali Luxe"));
    }

    #[test]
    fn test_blank_heading_is_present_but_empty() {
        let doc = HtmlDocument::parse("<h1>   <span> </span></h1>");
        assert_eq!(doc.heading().as_deref(), Some(""));
    }

    #[test]
    fn test_heading_absent() {
        let doc = HtmlDocument::parse("<html><body><h2>Not a title</h2></body></html>");
        assert_eq!(doc.heading(), None);
    }

    #[test]
    fn test_description_paragraphs_from_first_block_only() {
        let doc = HtmlDocument::parse(DETAIL);
        assert_eq!(
            doc.description_paragraphs(),
            vec![
                "First line.".to_string(),
                String::new(),
                "Second bold line.".to_string()
            ]
        );
    }

    #[test]
    fn test_description_block_absent() {
        let doc = HtmlDocument::parse("<p>stray paragraph</p>");
        assert!(doc.description_paragraphs().is_empty());
    }

    #[test]
    fn test_image_anchors_in_document_order_within_wrappers() {
        let doc = HtmlDocument::parse(DETAIL);
        assert_eq!(
            doc.image_anchors(),
            vec!["/img/one.jpg", "/img/two.png", "three.webp"]
        );
    }

    #[test]
    fn test_item_links_cover_whole_document() {
        let doc = HtmlDocument::parse(DETAIL);
        assert_eq!(
            doc.item_links(),
            vec!["/img/one.jpg", "/img/two.png", "/it/cucine/loose", "three.webp"]
        );
    }
}
