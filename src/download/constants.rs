//! Constants for the download module (timeouts, pooling, size limits).

use std::time::Duration;

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout (25 seconds between received bytes).
pub const READ_TIMEOUT_SECS: u64 = 25;

/// Idle connections kept per host in the shared pool.
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Maximum bytes accepted for a single image (40 MiB).
pub const MAX_IMAGE_BYTES: u64 = 40 * 1024 * 1024;

/// Extension used when an image URL carries no usable suffix.
pub const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

/// Longest URL suffix (dot included) accepted as a file extension.
pub const MAX_EXTENSION_LEN: usize = 5;

/// Maximum Retry-After value honoured before a retry (2 minutes).
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);
