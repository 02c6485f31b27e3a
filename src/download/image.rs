//! Two-phase image download: a header-only probe, then a capped stream.
//!
//! The probe decides whether a body transfer is worth starting at all. Only
//! when it passes is the image streamed to disk, chunk by chunk, with a
//! running byte count checked against the cap after every write.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::HttpClient;
use super::error::{FailureKind, FetchError, RejectReason};

/// What happened to one attempted image.
#[derive(Debug)]
pub struct DownloadOutcome {
    /// The image URL that was attempted.
    pub source_url: Url,
    /// Bytes written on success, or the reason it was skipped.
    pub result: Result<u64, FetchError>,
}

impl DownloadOutcome {
    /// Returns true when the image was saved.
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the failure category when the image was not saved.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.result.as_ref().err().map(FetchError::kind)
    }
}

/// Probes an image URL without transferring its body.
///
/// Redirects are followed. The resource is rejected when the final status is
/// 4xx/5xx, when the declared content type does not mention `image`, or when
/// a numeric `Content-Length` exceeds `byte_cap`. A failed probe request is
/// also a rejection.
///
/// # Errors
///
/// Always [`FetchError::Rejected`], carrying the reason.
#[instrument(skip(client), fields(url = %url))]
pub async fn probe_image(client: &HttpClient, url: &str, byte_cap: u64) -> Result<(), FetchError> {
    let response = match client.head(url).await {
        Ok(response) => response,
        Err(FetchError::HttpStatus { status, .. }) => {
            return Err(FetchError::rejected(url, RejectReason::ErrorStatus(status)));
        }
        Err(error) => {
            return Err(FetchError::rejected(
                url,
                RejectReason::Transport(error.to_string()),
            ));
        }
    };

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();
    if !content_type.contains("image") {
        return Err(FetchError::rejected(
            url,
            RejectReason::NotAnImage { content_type },
        ));
    }

    let declared = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if let Some(declared) = declared
        && declared > byte_cap
    {
        return Err(FetchError::rejected(
            url,
            RejectReason::DeclaredTooLarge {
                declared,
                limit: byte_cap,
            },
        ));
    }

    debug!(%content_type, ?declared, "probe accepted");
    Ok(())
}

/// Streams an image body to `dest`, aborting once it outgrows `byte_cap`.
///
/// The parent directory is created when missing. Each received chunk is
/// written before the running total is checked, so an aborted transfer
/// leaves its partial file behind.
///
/// # Errors
///
/// Returns [`FetchError::SizeLimitExceeded`] on overrun, status and transport
/// errors from the request, and [`FetchError::Io`] for local write failures.
#[instrument(skip(client), fields(url = %url, dest = %dest.display()))]
pub async fn stream_image(
    client: &HttpClient,
    url: &str,
    dest: &Path,
    byte_cap: u64,
) -> Result<u64, FetchError> {
    let response = client.get(url).await?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::io(parent, e))?;
    }
    let file = File::create(dest)
        .await
        .map_err(|e| FetchError::io(dest, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut total: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::from_reqwest(url, e))?;
        if chunk.is_empty() {
            continue;
        }

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(dest, e))?;
        total += chunk.len() as u64;

        if total > byte_cap {
            // Keep what was written; the partial file is not cleaned up here.
            writer.flush().await.map_err(|e| FetchError::io(dest, e))?;
            warn!(received = total, limit = byte_cap, "image exceeded byte cap, aborting");
            return Err(FetchError::size_limit_exceeded(url, byte_cap, total));
        }
    }

    writer.flush().await.map_err(|e| FetchError::io(dest, e))?;
    Ok(total)
}

/// Probes and, if accepted, downloads one image to `dest`.
///
/// Never fails outright: the outcome records either the bytes saved or the
/// reason the image was skipped. A rejected probe creates no file.
pub async fn fetch_image(
    client: &HttpClient,
    url: &Url,
    dest: &Path,
    byte_cap: u64,
) -> DownloadOutcome {
    let result = match probe_image(client, url.as_str(), byte_cap).await {
        Ok(()) => stream_image(client, url.as_str(), dest, byte_cap).await,
        Err(rejection) => Err(rejection),
    };

    match &result {
        Ok(bytes) => info!(url = %url, path = %dest.display(), bytes, "image saved"),
        Err(error) => debug!(url = %url, kind = ?error.kind(), error = %error, "image skipped"),
    }

    DownloadOutcome {
        source_url: url.clone(),
        result,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::download::{ClientSettings, RetryPolicy};

    fn client() -> HttpClient {
        HttpClient::with_settings(ClientSettings {
            retry_policy: RetryPolicy::with_max_retries(0).with_max_jitter(Duration::ZERO),
            ..ClientSettings::default()
        })
        .unwrap()
    }

    async fn mount_head(server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_probe_accepts_image_within_cap() {
        let server = MockServer::start().await;
        mount_head(
            &server,
            "/a.jpg",
            ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"),
        )
        .await;

        let result = probe_image(&client(), &format!("{}/a.jpg", server.uri()), 1024).await;
        assert!(result.is_ok(), "unexpected: {result:?}");
    }

    #[tokio::test]
    async fn test_probe_rejects_non_image_content_type() {
        let server = MockServer::start().await;
        mount_head(
            &server,
            "/a.jpg",
            ResponseTemplate::new(200).insert_header("content-type", "text/html; charset=utf-8"),
        )
        .await;

        let result = probe_image(&client(), &format!("{}/a.jpg", server.uri()), 1024).await;
        assert!(matches!(
            result,
            Err(FetchError::Rejected {
                reason: RejectReason::NotAnImage { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_probe_rejects_error_status() {
        let server = MockServer::start().await;
        mount_head(&server, "/gone.jpg", ResponseTemplate::new(410)).await;

        let result = probe_image(&client(), &format!("{}/gone.jpg", server.uri()), 1024).await;
        assert!(matches!(
            result,
            Err(FetchError::Rejected {
                reason: RejectReason::ErrorStatus(410),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_probe_rejects_declared_length_over_cap() {
        let server = MockServer::start().await;
        mount_head(
            &server,
            "/big.png",
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .insert_header("content-length", "64")
                .set_body_bytes(vec![0u8; 64]),
        )
        .await;

        let result = probe_image(&client(), &format!("{}/big.png", server.uri()), 16).await;
        assert!(matches!(
            result,
            Err(FetchError::Rejected {
                reason: RejectReason::DeclaredTooLarge { declared: 64, limit: 16 },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_probe_transport_failure_is_rejection() {
        // Nothing listens on port 9 of the loopback interface.
        let result = probe_image(&client(), "http://127.0.0.1:9/a.jpg", 1024).await;
        assert!(matches!(
            result,
            Err(FetchError::Rejected {
                reason: RejectReason::Transport(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_stream_image_writes_body_and_creates_parent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes".to_vec()))
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("nested").join("01.jpg");

        let bytes = stream_image(&client(), &format!("{}/a.jpg", server.uri()), &dest, 1024)
            .await
            .unwrap();

        assert_eq!(bytes, 10);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_stream_image_over_cap_fails_and_leaves_partial_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/huge.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("01.jpg");

        let result =
            stream_image(&client(), &format!("{}/huge.jpg", server.uri()), &dest, 100).await;

        assert!(matches!(
            result,
            Err(FetchError::SizeLimitExceeded { limit: 100, .. })
        ));
        assert!(dest.exists(), "partial file should be left on disk");
        assert!(std::fs::metadata(&dest).unwrap().len() > 100);
    }

    #[tokio::test]
    async fn test_stream_image_error_status_creates_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("01.jpg");

        let result = stream_image(&client(), &server.uri(), &dest, 100).await;

        assert!(matches!(result, Err(FetchError::HttpStatus { status: 404, .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_image_rejected_probe_skips_download() {
        let server = MockServer::start().await;
        mount_head(
            &server,
            "/a.jpg",
            ResponseTemplate::new(200).insert_header("content-type", "text/html"),
        )
        .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"never".to_vec()))
            .expect(0)
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("01.jpg");
        let url = Url::parse(&format!("{}/a.jpg", server.uri())).unwrap();

        let outcome = fetch_image(&client(), &url, &dest, 1024).await;

        assert!(!outcome.success());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ValidationRejection));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_image_success() {
        let server = MockServer::start().await;
        mount_head(
            &server,
            "/a.webp",
            ResponseTemplate::new(200).insert_header("content-type", "image/webp"),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/a.webp"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFwebp".to_vec()))
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("01.webp");
        let url = Url::parse(&format!("{}/a.webp", server.uri())).unwrap();

        let outcome = fetch_image(&client(), &url, &dest, 1024).await;

        assert!(outcome.success());
        assert_eq!(outcome.source_url, url);
        assert_eq!(std::fs::read(&dest).unwrap(), b"RIFFwebp");
    }
}
