use scraper_core::{
    BlogTarget, CoreError, FilterCriteria, OutputFormat, PostSource, RunRequest, Source,
};
use tracing::{info, warn};

use crate::paginator::{Paginator, RunOutcome, RunStatus, StopReason};

#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub request: RunRequest,
    pub outcome: RunOutcome,
}

/// Build one request per configured blog.
///
/// Every request shares the flags of `template`. When `template` carries
/// keywords they replace each blog's own list.
pub fn batch_requests(
    targets: &[BlogTarget],
    template: &FilterCriteria,
    limit: usize,
    format: OutputFormat,
) -> Result<Vec<RunRequest>, CoreError> {
    targets
        .iter()
        .map(|target| {
            let keywords = if template.keywords.is_empty() {
                FilterCriteria::new(&target.keywords).keywords
            } else {
                template.keywords.clone()
            };
            let criteria = FilterCriteria {
                keywords,
                ..template.clone()
            };
            RunRequest::new(Source::blog(&target.name)?, limit, criteria, format)
        })
        .collect()
}

/// Run each request in turn on one paginator.
///
/// A failed blog does not stop the batch. Cancellation does: the entry that
/// saw it is kept and the remaining requests are not started.
pub async fn run_batch<S: PostSource>(
    paginator: &mut Paginator<S>,
    requests: Vec<RunRequest>,
) -> Vec<BatchEntry> {
    let total = requests.len();
    let mut entries = Vec::with_capacity(total);

    for (index, request) in requests.into_iter().enumerate() {
        info!("Batch {}/{}: {}", index + 1, total, request.source);
        let outcome = paginator.run(&request).await;
        let cancelled = outcome.stop_reason == StopReason::Cancelled;
        entries.push(BatchEntry { request, outcome });

        if cancelled {
            warn!("Batch cancelled after {} of {} sources", index + 1, total);
            break;
        }
    }

    entries
}

/// Worst status across a batch; an empty batch counts as success.
pub fn batch_status(entries: &[BatchEntry]) -> RunStatus {
    entries
        .iter()
        .fold(RunStatus::Success, |status, entry| status.worst(entry.outcome.status))
}
