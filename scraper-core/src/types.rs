use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, TumblrApiError};

/// Canonical post record produced by the normalizer.
///
/// Field order is the column order of the CSV and JSON exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub blog_name: String,
    pub post_url: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub timestamp: Option<i64>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub caption: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub note_count: u64,
    pub matched_keywords: Vec<String>,
    pub scraped_at: DateTime<Utc>,
    pub is_reblog: bool,
    pub reblog_key: Option<String>,
}

/// A post exactly as the API returned it. Nothing about its shape is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPost(pub serde_json::Value);

impl RawPost {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }
}

impl From<serde_json::Value> for RawPost {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    Tag(String),
    Blog(String),
}

impl Source {
    pub fn tag(name: &str) -> Result<Self, CoreError> {
        let name = name.trim().trim_start_matches('#').trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "tag must not be empty".to_string(),
            });
        }
        Ok(Source::Tag(name.to_string()))
    }

    /// Accepts either a blog name (`staff`) or a hostname (`staff.tumblr.com`).
    pub fn blog(name: &str) -> Result<Self, CoreError> {
        let name = name.trim();
        if name.is_empty() || name.contains('/') || name.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidInput {
                message: format!("'{}' is not a valid blog identifier", name),
            });
        }
        Ok(Source::Blog(name.to_string()))
    }

    pub fn name(&self) -> &str {
        match self {
            Source::Tag(name) | Source::Blog(name) => name,
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Source::Tag(_))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Tag(name) => write!(f, "tag #{}", name),
            Source::Blog(name) => write!(f, "blog {}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub source: Source,
    pub offset: u64,
    pub page_size: u32,
    /// Timestamp cursor for tag searches, which page by time instead of offset.
    pub before: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub posts: Vec<RawPost>,
    /// Total posts available from the source, when the endpoint reports it.
    pub total_posts: Option<u64>,
}

impl Page {
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self {
            posts,
            total_posts: None,
        }
    }

    pub fn with_total(mut self, total_posts: u64) -> Self {
        self.total_posts = Some(total_posts);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// The platform API boundary: one call returns one page of raw posts.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, TumblrApiError>;
}

#[async_trait]
impl<T: PostSource + ?Sized> PostSource for &T {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, TumblrApiError> {
        (**self).fetch_page(request).await
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
    pub exact_match: bool,
    pub min_notes: u64,
    pub exclude_reblogs: bool,
}

impl FilterCriteria {
    /// Keywords are trimmed; blanks and repeats are dropped, first occurrence
    /// keeps its place.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            if !keyword.is_empty() && !unique.iter().any(|k| k == keyword) {
                unique.push(keyword.to_string());
            }
        }
        let keywords = unique;

        Self {
            keywords,
            ..Default::default()
        }
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    pub fn exact_match(mut self, enabled: bool) -> Self {
        self.exact_match = enabled;
        self
    }

    pub fn min_notes(mut self, min_notes: u64) -> Self {
        self.min_notes = min_notes;
        self
    }

    pub fn exclude_reblogs(mut self, enabled: bool) -> Self {
        self.exclude_reblogs = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub source: Source,
    pub limit: usize,
    pub criteria: FilterCriteria,
    pub format: OutputFormat,
}

impl RunRequest {
    pub fn new(
        source: Source,
        limit: usize,
        criteria: FilterCriteria,
        format: OutputFormat,
    ) -> Result<Self, CoreError> {
        if limit == 0 {
            return Err(CoreError::InvalidInput {
                message: "limit must be a positive integer".to_string(),
            });
        }

        Ok(Self {
            source,
            limit,
            criteria,
            format,
        })
    }
}
