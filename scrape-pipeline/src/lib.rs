//! The fetch-filter-paginate pipeline.
//!
//! A [`Paginator`] pulls pages from any [`scraper_core::PostSource`], turns raw
//! records into posts, keeps the ones the keyword filter accepts and stops once
//! the requested number of posts is collected or the source gives out.

pub mod accumulator;
pub mod batch;
pub mod filter;
pub mod normalizer;
pub mod paginator;

pub use accumulator::ResultAccumulator;
pub use batch::{batch_requests, batch_status, run_batch, BatchEntry};
pub use filter::{matches, searchable_text, FilterResult};
pub use normalizer::{normalize, normalize_at};
pub use paginator::{Paginator, RunOutcome, RunStats, RunStatus, StopReason};
