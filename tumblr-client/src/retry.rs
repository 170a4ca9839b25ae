use scraper_core::{ErrorExt, Page, RetryConfig, TumblrApiError};
use std::time::Duration;

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Retry after the delay the server asked for
    RetryWithDelay(Duration),
    /// Don't retry (for permanent failures)
    NoRetry,
}

/// Determine retry strategy based on error type
pub fn get_retry_strategy(error: &TumblrApiError) -> RetryStrategy {
    if !error.is_retryable() {
        return RetryStrategy::NoRetry;
    }

    match error.retry_after() {
        Some(delay) => RetryStrategy::RetryWithDelay(delay),
        None => RetryStrategy::Retry,
    }
}

/// Calculate delay with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_delay = Duration::from_millis(config.base_delay_ms);
    let max_delay = Duration::from_millis(config.max_delay_ms);

    // Calculate exponential backoff
    let exponential_delay = if attempt == 0 {
        base_delay
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms.min(config.max_delay_ms))
    };

    // Random jitter on top of the backoff
    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);
    let final_delay = exponential_delay + Duration::from_millis(jitter);

    // Ensure we don't exceed max delay
    final_delay.min(max_delay)
}

/// Result of one fetch attempt, as the paginator consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Page(Page),
    Retry {
        reason: TumblrApiError,
        delay: Option<Duration>,
    },
    Fatal(TumblrApiError),
}

/// How long to back off before retry number `attempt` (0-based).
///
/// A server-requested delay wins over the computed backoff but is still capped
/// at `max_delay_ms`.
pub fn backoff_delay(requested: Option<Duration>, attempt: u32, config: &RetryConfig) -> Duration {
    match requested {
        Some(delay) => delay.min(Duration::from_millis(config.max_delay_ms)),
        None => calculate_delay(attempt, config),
    }
}

impl From<Result<Page, TumblrApiError>> for FetchOutcome {
    fn from(result: Result<Page, TumblrApiError>) -> Self {
        match result {
            Ok(page) => FetchOutcome::Page(page),
            Err(error) => match get_retry_strategy(&error) {
                RetryStrategy::Retry => FetchOutcome::Retry {
                    reason: error,
                    delay: None,
                },
                RetryStrategy::RetryWithDelay(delay) => FetchOutcome::Retry {
                    reason: error,
                    delay: Some(delay),
                },
                RetryStrategy::NoRetry => FetchOutcome::Fatal(error),
            },
        }
    }
}
