pub mod api;
pub mod rate_limiter;
pub mod retry;


pub use api::TumblrApiClient;
pub use rate_limiter::RateLimiter;
pub use retry::{backoff_delay, calculate_delay, get_retry_strategy, FetchOutcome, RetryStrategy};
