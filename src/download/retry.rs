//! Retry logic with exponential backoff for transient request failures.
//!
//! Every page fetch, probe and image request goes through the same policy:
//! a fixed set of transient statuses (429, 500, 502, 503, 504) and transport
//! failures are retried with exponential backoff, everything else fails at
//! once.
//!
//! # Example
//!
//! ```
//! use kitchen_scraper::download::{
//!     FetchError, RetryPolicy, FailureType, RetryDecision, classify_error
//! };
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://example.com/it/cucine", 503);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument, warn};

use super::FetchError;
use super::constants::MAX_RETRY_AFTER;

/// Default maximum attempts (one initial request plus four retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay for exponential backoff (500 milliseconds).
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default maximum delay cap (30 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Default maximum jitter added to delays (250ms).
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(250);

/// Classification of request failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry (timeouts, 5xx gateway errors).
    Transient,

    /// Failure that won't succeed regardless of retries.
    Permanent,

    /// Server rate limiting (HTTP 429).
    RateLimited,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the request.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt - 1), max_delay) + jitter
/// ```
///
/// With defaults, delays are approximately: 0.5s, 1s, 2s, 4s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Base delay for the first retry.
    base_delay: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Multiplier applied each attempt.
    backoff_multiplier: f32,

    /// Upper bound of the random jitter added to each delay.
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum attempts including initial (must be >= 1)
    /// * `base_delay` - Base delay for first retry
    /// * `max_delay` - Maximum delay cap
    /// * `backoff_multiplier` - Multiplier for exponential increase
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    /// Creates a policy allowing `max_retries` retries after the first attempt.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Replaces the jitter bound (use `Duration::ZERO` for deterministic delays).
    #[must_use]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry a failed request.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    #[instrument(level = "trace", skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let multiplier = f64::from(self.backoff_multiplier);

        // attempt 1 = base * multiplier^0
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * multiplier.powf(exponent);

        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + self.calculate_jitter()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn calculate_jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(0..=max_ms))
    }
}

/// Classifies a fetch error into a failure type for retry decisions.
///
/// # HTTP Status Code Classification
///
/// | Status | Type |
/// |--------|------|
/// | 429 | RateLimited |
/// | 500, 502, 503, 504 | Transient |
/// | anything else | Permanent |
///
/// # Non-HTTP Errors
///
/// | Error | Type |
/// |-------|------|
/// | Timeout | Transient |
/// | Network (most) | Transient |
/// | Network (TLS) | Permanent |
/// | IO, InvalidUrl, Rejected, SizeLimitExceeded | Permanent |
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::HttpStatus { status, .. } => classify_http_status(*status),

        FetchError::Timeout { .. } => FailureType::Transient,

        FetchError::Network { source, .. } => {
            if is_tls_error(source) {
                FailureType::Permanent
            } else {
                FailureType::Transient
            }
        }

        FetchError::Io { .. }
        | FetchError::InvalidUrl { .. }
        | FetchError::Rejected { .. }
        | FetchError::SizeLimitExceeded { .. } => FailureType::Permanent,
    }
}

#[allow(clippy::match_same_arms)]
fn classify_http_status(status: u16) -> FailureType {
    match status {
        429 => FailureType::RateLimited, // Too Many Requests
        500 => FailureType::Transient,   // Internal Server Error
        502 => FailureType::Transient,   // Bad Gateway
        503 => FailureType::Transient,   // Service Unavailable
        504 => FailureType::Transient,   // Gateway Timeout
        _ => FailureType::Permanent,
    }
}

fn is_tls_error(error: &reqwest::Error) -> bool {
    let error_string = error.to_string().to_lowercase();
    error_string.contains("certificate")
        || error_string.contains("tls")
        || error_string.contains("ssl")
        || error_string.contains("handshake")
}

/// Parses a Retry-After header value into a delay.
///
/// Accepts delta-seconds or an HTTP-date. Values above two minutes are
/// capped; negative values and dates in the past yield `None`.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        let Ok(seconds) = u64::try_from(seconds) else {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        };
        return Some(cap_retry_after(Duration::from_secs(seconds)));
    }

    let datetime = httpdate::parse_http_date(header_value).ok()?;
    match datetime.duration_since(std::time::SystemTime::now()) {
        Ok(duration) => Some(cap_retry_after(duration)),
        Err(_) => {
            debug!(header_value, "Retry-After date is in the past, ignoring");
            None
        }
    }
}

fn cap_retry_after(delay: Duration) -> Duration {
    if delay > MAX_RETRY_AFTER {
        warn!(
            delay_secs = delay.as_secs(),
            max_secs = MAX_RETRY_AFTER.as_secs(),
            "Retry-After exceeds maximum, capping"
        );
        MAX_RETRY_AFTER
    } else {
        delay
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== RetryPolicy Tests ====================

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!((policy.backoff_multiplier - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_retry_policy_with_max_retries_counts_initial_attempt() {
        assert_eq!(RetryPolicy::with_max_retries(4).max_attempts(), 5);
        assert_eq!(RetryPolicy::with_max_retries(0).max_attempts(), 1);
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO, 2.0);
        assert_eq!(policy.max_attempts(), 1);
    }

    // ==================== Delay Calculation Tests ====================

    #[test]
    fn test_delay_doubles_without_jitter() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500), Duration::from_secs(30), 2.0)
            .with_max_jitter(Duration::ZERO);
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(500));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(1000));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(2000));
        assert_eq!(policy.calculate_delay(4), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_calculation_respects_max_delay() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(5), 2.0)
            .with_max_jitter(Duration::ZERO);
        assert_eq!(policy.calculate_delay(6), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let jitter = policy.calculate_jitter();
            assert!(jitter <= DEFAULT_MAX_JITTER, "Jitter {jitter:?} exceeds max");
        }
    }

    // ==================== Error Classification Tests ====================

    #[test]
    fn test_classify_forcelist_statuses() {
        for status in [500, 502, 503, 504] {
            let error = FetchError::http_status("http://example.com", status);
            assert_eq!(classify_error(&error), FailureType::Transient, "status {status}");
        }
        let error = FetchError::http_status("http://example.com", 429);
        assert_eq!(classify_error(&error), FailureType::RateLimited);
    }

    #[test]
    fn test_classify_other_statuses_permanent() {
        for status in [400, 401, 403, 404, 408, 410, 501] {
            let error = FetchError::http_status("http://example.com", status);
            assert_eq!(classify_error(&error), FailureType::Permanent, "status {status}");
        }
    }

    #[test]
    fn test_classify_timeout_transient() {
        let error = FetchError::timeout("http://example.com");
        assert_eq!(classify_error(&error), FailureType::Transient);
    }

    #[test]
    fn test_classify_size_limit_permanent() {
        let error = FetchError::size_limit_exceeded("http://example.com/a.jpg", 1, 2);
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    // ==================== Should Retry Decision Tests ====================

    #[test]
    fn test_should_retry_permanent_does_not_retry() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Permanent, 1);
        assert!(
            matches!(decision, RetryDecision::DoNotRetry { ref reason } if reason.contains("permanent"))
        );
    }

    #[test]
    fn test_should_retry_respects_max_attempts() {
        let policy = RetryPolicy::with_max_retries(2);

        assert!(matches!(
            policy.should_retry(FailureType::Transient, 1),
            RetryDecision::Retry { attempt: 2, .. }
        ));
        assert!(matches!(
            policy.should_retry(FailureType::RateLimited, 2),
            RetryDecision::Retry { attempt: 3, .. }
        ));
        let decision = policy.should_retry(FailureType::Transient, 3);
        assert!(
            matches!(decision, RetryDecision::DoNotRetry { ref reason } if reason.contains("exhausted"))
        );
    }

    // ==================== Retry-After Tests ====================

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_retry_after_caps_large_values() {
        assert_eq!(parse_retry_after("86400"), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn test_parse_retry_after_rejects_negative_and_garbage() {
        assert_eq!(parse_retry_after("-5"), None);
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_parse_retry_after_past_http_date() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
