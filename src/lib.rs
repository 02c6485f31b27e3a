//! Kitchen Scraper Core Library
//!
//! This library discovers the kitchen catalog of a single site, extracts the
//! description and gallery of each selected detail page, downloads the
//! gallery images under strict size and time limits, and packages the result
//! into a zip archive with a CSV manifest.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Detail-URL classification and catalog discovery
//! - [`config`] - Site layout and run tunables
//! - [`download`] - HTTP client with retry, image probing and capped streaming
//! - [`extract`] - Page markup access and description/gallery extraction
//! - [`output`] - Manifest rows and archive packaging
//! - [`pipeline`] - Per-run orchestration over a catalog snapshot

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod download;
pub mod extract;
pub mod output;
pub mod pipeline;
mod user_agent;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogEntry, discover, is_detail_url};
pub use config::{ConfigError, ScraperConfig, SiteLayout};
pub use download::{
    ClientSettings, DownloadOutcome, FailureKind, FetchError, HttpClient, RetryPolicy,
    fetch_image,
};
pub use extract::{ExtractionResult, HtmlDocument, PageMarkup, extract, extract_page};
pub use output::{ManifestRecord, OutputError};
pub use pipeline::{Pipeline, PipelineError, RunOutcome};
