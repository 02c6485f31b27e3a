//! HTTP access for the scraper: pooled client, retry, and image downloads.
//!
//! This module provides the shared [`HttpClient`] used for listing and detail
//! pages, plus the two-phase image download (header probe, then a streamed
//! body with a hard byte cap).
//!
//! # Features
//!
//! - One connection pool reused for every request in a run
//! - Transparent retry with exponential backoff on 429/500/502/503/504
//! - Fixed connect/read timeouts (10s / 25s by default)
//! - Structured error types with a broad [`FailureKind`] for skip-and-log handling
//!
//! # Example
//!
//! ```no_run
//! use kitchen_scraper::download::{HttpClient, fetch_image, MAX_IMAGE_BYTES};
//! use std::path::Path;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let url = Url::parse("https://www.creokitchens.it/wp-content/uploads/kali.jpg")?;
//! let outcome = fetch_image(&client, &url, Path::new("./out/Kali/01.jpg"), MAX_IMAGE_BYTES).await;
//! println!("saved: {}", outcome.success());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
pub mod filename;
mod image;
mod retry;

pub use client::{ClientSettings, HttpClient};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_IMAGE_EXTENSION, MAX_IMAGE_BYTES, POOL_MAX_IDLE_PER_HOST,
    READ_TIMEOUT_SECS,
};
pub use error::{FailureKind, FetchError, RejectReason};
pub use image::{DownloadOutcome, fetch_image, probe_image, stream_image};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_error,
    parse_retry_after,
};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, FetchError>` explicitly in function signatures.
