use scraper_core::{
    AppConfig, ErrorExt, Page, PageRequest, Post, PostSource, RetryConfig, RunRequest, Source,
    TumblrApiError,
};
use std::fmt;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tumblr_client::{backoff_delay, FetchOutcome, RateLimiter};

use crate::accumulator::ResultAccumulator;
use crate::filter::matches;
use crate::normalizer::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    PartialFailure,
    Fatal,
}

impl RunStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::PartialFailure => 2,
            RunStatus::Fatal => 1,
        }
    }

    fn severity(&self) -> u8 {
        match self {
            RunStatus::Success => 0,
            RunStatus::PartialFailure => 1,
            RunStatus::Fatal => 2,
        }
    }

    /// The more severe of the two statuses.
    pub fn worst(self, other: RunStatus) -> RunStatus {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::PartialFailure => write!(f, "partial failure"),
            RunStatus::Fatal => write!(f, "fatal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    LimitReached,
    Exhausted,
    RetriesExhausted(TumblrApiError),
    FatalError(TumblrApiError),
    Cancelled,
}

impl StopReason {
    pub fn status(&self) -> RunStatus {
        match self {
            StopReason::LimitReached | StopReason::Exhausted => RunStatus::Success,
            StopReason::RetriesExhausted(_) | StopReason::Cancelled => RunStatus::PartialFailure,
            StopReason::FatalError(_) => RunStatus::Fatal,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::LimitReached => write!(f, "limit reached"),
            StopReason::Exhausted => write!(f, "source exhausted"),
            StopReason::RetriesExhausted(e) => write!(f, "retries exhausted: {}", e),
            StopReason::FatalError(e) => write!(f, "fatal error: {}", e),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages_fetched: u32,
    pub fetch_attempts: u32,
    pub retries: u32,
    pub malformed: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub stop_reason: StopReason,
    pub posts: Vec<Post>,
    pub stats: RunStats,
}

impl RunOutcome {
    /// Records skipped because they could not be normalized.
    pub fn skipped(&self) -> usize {
        self.stats.malformed
    }
}

enum State {
    Fetching,
    Filtering(Page),
    Done(StopReason),
    Failed(StopReason),
}

/// Where the next page starts. Blogs page by offset, tag searches by the
/// timestamp of the oldest post seen so far.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    offset: u64,
    before: Option<i64>,
}

impl Cursor {
    /// The cursor for the page after `page`, or `None` when the source has
    /// nothing further to give.
    fn advance(self, source: &Source, page: &Page, page_size: u32) -> Option<Cursor> {
        let offset = self.offset + u64::from(page_size);
        if let Some(total) = page.total_posts {
            if offset >= total {
                debug!("Offset {} reaches reported total of {}", offset, total);
                return None;
            }
        }

        if !source.is_tag() {
            return Some(Cursor { offset, ..self });
        }

        // Oldest timestamp on the page; records without one are ignored.
        let oldest_timestamp = page
            .posts
            .iter()
            .filter_map(|raw| match raw.get("timestamp")? {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .min();
        match (oldest_timestamp, self.before) {
            (Some(next), Some(current)) if next >= current => {
                warn!("Tag cursor stalled at {}, stopping", current);
                None
            }
            (Some(next), _) => Some(Cursor {
                offset,
                before: Some(next),
            }),
            (None, _) => {
                warn!("No post on the tag page has a timestamp, cannot page further");
                None
            }
        }
    }
}

/// Drives fetch, normalize, filter and accumulate until a stop condition.
///
/// The paginator owns its [`RateLimiter`], so calling [`Paginator::run`]
/// repeatedly on one instance keeps the same request pacing across runs.
pub struct Paginator<S> {
    source: S,
    rate_limiter: RateLimiter,
    retry: RetryConfig,
    page_size: u32,
    cancel: CancellationToken,
}

impl<S: PostSource> Paginator<S> {
    pub fn new(source: S, rate_limiter: RateLimiter, retry: RetryConfig, page_size: u32) -> Self {
        Self {
            source,
            rate_limiter,
            retry,
            page_size: page_size.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(source: S, config: &AppConfig) -> Self {
        Self::new(
            source,
            RateLimiter::new(&config.rate_limit),
            config.retry.clone(),
            config.scrape.page_size,
        )
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&mut self, request: &RunRequest) -> RunOutcome {
        let mut accumulator = ResultAccumulator::new(request.limit);
        let mut stats = RunStats::default();
        let mut cursor = Cursor::default();
        let mut state = State::Fetching;

        info!(
            "Scraping {} (limit {}, page size {}, {} keywords)",
            request.source,
            request.limit,
            self.page_size,
            request.criteria.keywords.len()
        );

        let stop_reason = loop {
            state = match state {
                State::Fetching => {
                    if self.cancel.is_cancelled() {
                        info!("Cancellation requested, stopping before next page");
                        State::Done(StopReason::Cancelled)
                    } else {
                        let page_request = PageRequest {
                            source: request.source.clone(),
                            offset: cursor.offset,
                            page_size: self.page_size,
                            before: cursor.before,
                        };
                        match self.fetch_with_retry(&page_request, &mut stats).await {
                            FetchOutcome::Page(page) if page.is_empty() => {
                                debug!("Empty page at offset {}", cursor.offset);
                                State::Done(StopReason::Exhausted)
                            }
                            FetchOutcome::Page(page) => {
                                stats.pages_fetched += 1;
                                State::Filtering(page)
                            }
                            FetchOutcome::Retry { reason, .. } => {
                                State::Failed(StopReason::RetriesExhausted(reason))
                            }
                            FetchOutcome::Fatal(reason) => {
                                reason.log_error();
                                State::Failed(StopReason::FatalError(reason))
                            }
                        }
                    }
                }
                State::Filtering(page) => {
                    self.filter_page(&page, request, &mut accumulator, &mut stats);
                    info!(
                        "Page {} of {}: {} records, {}/{} posts collected",
                        stats.pages_fetched,
                        request.source,
                        page.posts.len(),
                        accumulator.len(),
                        request.limit
                    );

                    if accumulator.is_full() {
                        State::Done(StopReason::LimitReached)
                    } else {
                        match cursor.advance(&request.source, &page, self.page_size) {
                            Some(next) => {
                                cursor = next;
                                State::Fetching
                            }
                            None => State::Done(StopReason::Exhausted),
                        }
                    }
                }
                State::Done(reason) | State::Failed(reason) => break reason,
            };
        };

        let status = stop_reason.status();
        let posts = accumulator.into_posts();
        match status {
            RunStatus::Success => info!(
                "Finished {}: {} posts ({}), {} malformed, {} duplicates, {} rejected",
                request.source,
                posts.len(),
                stop_reason,
                stats.malformed,
                stats.duplicates,
                stats.rejected
            ),
            _ => warn!(
                "Stopped {} early: {}, keeping {} posts",
                request.source,
                stop_reason,
                posts.len()
            ),
        }

        RunOutcome {
            status,
            stop_reason,
            posts,
            stats,
        }
    }

    /// One page fetch with retries. Every attempt passes the rate limiter.
    async fn fetch_with_retry(&mut self, request: &PageRequest, stats: &mut RunStats) -> FetchOutcome {
        let mut retries = 0u32;

        loop {
            self.rate_limiter.wait().await;
            stats.fetch_attempts += 1;
            debug!(
                "Fetching {} at offset {} (before {:?})",
                request.source, request.offset, request.before
            );

            match FetchOutcome::from(self.source.fetch_page(request).await) {
                FetchOutcome::Retry { reason, delay } if retries < self.retry.max_retries => {
                    let backoff = backoff_delay(delay, retries, &self.retry);
                    retries += 1;
                    stats.retries += 1;
                    warn!(
                        "Transient failure fetching {} ({}), retry {}/{} in {:?}",
                        request.source, reason, retries, self.retry.max_retries, backoff
                    );
                    sleep(backoff).await;
                }
                FetchOutcome::Retry { reason, delay } => {
                    error!(
                        "Giving up on {} after {} retries: {}",
                        request.source, retries, reason
                    );
                    return FetchOutcome::Retry { reason, delay };
                }
                outcome => return outcome,
            }
        }
    }

    fn filter_page(
        &self,
        page: &Page,
        request: &RunRequest,
        accumulator: &mut ResultAccumulator,
        stats: &mut RunStats,
    ) {
        for raw in &page.posts {
            let mut post = match normalize(raw) {
                Ok(post) => post,
                Err(e) => {
                    e.log_warn();
                    stats.malformed += 1;
                    continue;
                }
            };

            if accumulator.contains(&post.id) {
                debug!("Skipping duplicate post {}", post.id);
                stats.duplicates += 1;
                continue;
            }

            let result = matches(&post, &request.criteria);
            if !result.matched {
                stats.rejected += 1;
                continue;
            }

            post.matched_keywords = result.matched_keywords;
            accumulator.push(post);
            if accumulator.is_full() {
                debug!("Limit of {} reached mid-page", request.limit);
                break;
            }
        }
    }
}
