use scraper_core::RateLimitConfig;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Minimum-interval gate in front of every API call.
///
/// The limiter is a plain value owned by whoever drives the requests, so two
/// runs never share a last-call timestamp.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_interval(config.min_interval())
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Suspend until `min_interval` has passed since the previous `wait`
    /// returned. The first call returns immediately. Returns the time waited.
    pub async fn wait(&mut self) -> Duration {
        let waited = match self.last_call {
            Some(last_call) => {
                let ready_at = last_call + self.min_interval;
                let now = Instant::now();
                if ready_at > now {
                    let wait_time = ready_at - now;
                    debug!("Rate limit gate, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                    wait_time
                } else {
                    Duration::ZERO
                }
            }
            None => Duration::ZERO,
        };

        self.last_call = Some(Instant::now());
        waited
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
