//! Shared helpers for integration tests: socket guard, page fixtures and a
//! fast, pacing-free configuration pointed at a mock server.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;
use std::time::Duration;

use kitchen_scraper::{ClientSettings, HttpClient, RetryPolicy, ScraperConfig, SiteLayout};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CATALOG_PATH: &str = "/it/cucine";

/// Skips the current test (returns early) when no localhost socket can be bound.
macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = support::socket_guard::start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

/// Client without retries or jitter so failures surface immediately.
pub fn fast_client() -> HttpClient {
    HttpClient::with_settings(fast_settings(0)).expect("client builds")
}

pub fn fast_settings(max_retries: u32) -> ClientSettings {
    ClientSettings {
        retry_policy: RetryPolicy::new(
            max_retries + 1,
            Duration::from_millis(1),
            Duration::from_millis(5),
            2.0,
        )
        .with_max_jitter(Duration::ZERO),
        ..ClientSettings::default()
    }
}

/// Configuration writing under `root` and targeting `server`, with no pacing.
pub fn fast_config(server: &MockServer, root: &Path) -> ScraperConfig {
    let site = SiteLayout::new(&server.uri(), CATALOG_PATH).expect("mock site layout");
    ScraperConfig {
        client: fast_settings(0),
        output_dir: root.join("creo_cucine"),
        archive_path: root.join("creo_cucine.zip"),
        entry_delay: Duration::ZERO,
        image_delay: Duration::ZERO,
        discovery_delay: Duration::ZERO,
        ..ScraperConfig::for_site(site)
    }
}

/// Listing page with one catalog item link per href.
pub fn listing_page(hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<a class="gb-item-link" href="{href}">item</a>"#))
        .collect::<Vec<_>>()
        .join("\n");
    format!("<html><body><nav><a href=\"/it/contatti\">Contatti</a></nav>{links}</body></html>")
}

/// Detail page with optional heading, one description block and one gallery.
pub fn detail_page(heading: Option<&str>, paragraphs: &[&str], image_hrefs: &[&str]) -> String {
    let heading = heading.map(|h| format!("<h1>{h}</h1>")).unwrap_or_default();
    let paragraphs: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    let anchors: String = image_hrefs
        .iter()
        .map(|href| format!(r#"<a class="gb-item-link" href="{href}"><img src="thumb.jpg"></a>"#))
        .collect();
    format!(
        r#"<html><body>{heading}
<div class="gb-text-and-link">{paragraphs}</div>
<div class="gb-media-wrapper">{anchors}</div>
</body></html>"#
    )
}

pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Mounts a probe-passing HEAD and a GET returning `bytes` for an image route.
pub async fn mount_image(server: &MockServer, route: &str, bytes: Vec<u8>) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(bytes),
        )
        .mount(server)
        .await;
}
