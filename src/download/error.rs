//! Error types for the download module.
//!
//! Every network failure the scraper can meet is captured here with enough
//! context (URL, path, status) to produce a readable log line. Callers match
//! on [`FetchError::kind`] when they only care about the broad category.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching pages, probing or downloading images.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present.
        retry_after: Option<String>,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// File system error while writing a download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The header-only probe refused the resource before any body transfer.
    #[error("rejected {url}: {reason}")]
    Rejected {
        /// The probed URL.
        url: String,
        /// Why the probe refused it.
        reason: RejectReason,
    },

    /// The streamed body grew past the byte cap.
    #[error("{url} exceeded {limit} bytes (received {received})")]
    SizeLimitExceeded {
        /// The URL being streamed.
        url: String,
        /// The byte cap in force.
        limit: u64,
        /// Bytes received when the transfer was aborted.
        received: u64,
    },
}

/// Reasons a probe refuses an image before download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The probe ended on a 4xx/5xx status.
    ErrorStatus(u16),
    /// The declared content type is not an image.
    NotAnImage {
        /// Declared `Content-Type`, empty when absent.
        content_type: String,
    },
    /// The declared `Content-Length` is above the cap.
    DeclaredTooLarge {
        /// Declared size in bytes.
        declared: u64,
        /// The byte cap in force.
        limit: u64,
    },
    /// The probe request itself failed to complete.
    Transport(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ErrorStatus(status) => write!(f, "probe returned HTTP {status}"),
            Self::NotAnImage { content_type } if content_type.is_empty() => {
                write!(f, "no content type declared")
            }
            Self::NotAnImage { content_type } => write!(f, "content type {content_type} is not an image"),
            Self::DeclaredTooLarge { declared, limit } => {
                write!(f, "declared length {declared} exceeds {limit} bytes")
            }
            Self::Transport(message) => write!(f, "probe failed: {message}"),
        }
    }
}

/// Broad failure categories used for logging and skip decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, timeout, DNS or malformed-URL failure.
    Transport,
    /// The server answered with a non-success status.
    HttpStatus,
    /// The probe refused the resource (content type or declared size).
    ValidationRejection,
    /// The body outgrew the byte cap mid-transfer.
    SizeLimitExceeded,
    /// A local file could not be written.
    LocalIo,
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a reqwest send/read failure, separating timeouts from other transport errors.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a probe rejection.
    pub fn rejected(url: impl Into<String>, reason: RejectReason) -> Self {
        Self::Rejected {
            url: url.into(),
            reason,
        }
    }

    /// Creates a mid-stream size overrun error.
    pub fn size_limit_exceeded(url: impl Into<String>, limit: u64, received: u64) -> Self {
        Self::SizeLimitExceeded {
            url: url.into(),
            limit,
            received,
        }
    }

    /// Returns the broad category of this failure.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::InvalidUrl { .. } => {
                FailureKind::Transport
            }
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::Rejected { .. } => FailureKind::ValidationRejection,
            Self::SizeLimitExceeded { .. } => FailureKind::SizeLimitExceeded,
            Self::Io { .. } => FailureKind::LocalIo,
        }
    }
}

// Note on From trait implementations:
// We do NOT implement `From<reqwest::Error>` or `From<std::io::Error>`
// because our error variants require context (url, path) that the source
// errors don't provide. Use the helper constructors instead.
