use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use scraper_core::{
    ApiConfig, ConfigError, CoreError, Page, PageRequest, PostSource, RawPost, Source,
    TumblrApiError,
};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// Seconds to back off after a 429 that carries no `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct TumblrEnvelope<T> {
    pub meta: TumblrMeta,
    pub response: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TumblrMeta {
    pub status: u16,
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogPostsResponse {
    #[serde(default)]
    pub posts: Vec<RawPost>,
    pub total_posts: Option<u64>,
}

#[derive(Debug)]
pub struct TumblrApiClient {
    http_client: Client,
    base_url: Url,
    api_key: String,
}

impl TumblrApiClient {
    pub fn new(api_key: impl Into<String>, config: &ApiConfig) -> Result<Self, CoreError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                value: config.base_url.clone(),
            })?;

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn make_request(
        &self,
        url: Url,
        query_params: &[(&str, String)],
        source_name: &str,
    ) -> Result<Vec<u8>, TumblrApiError> {
        let start_time = Instant::now();
        let endpoint = url.path().to_string();

        info!("Making Tumblr API request: GET {}", endpoint);
        let response = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for GET {}: {}", endpoint, e);
                classify_transport_error(&e)
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if let Some(api_error) = classify_status(status, retry_after.as_deref(), &endpoint, source_name)
        {
            error!("Request failed with status: {} for {}", status, endpoint);
            return Err(api_error);
        }

        let body = response.bytes().await.map_err(|e| {
            warn!("Failed to read response body from {}: {}", endpoint, e);
            classify_transport_error(&e)
        })?;

        debug!(
            "Request successful: {} {} in {:?}",
            status,
            endpoint,
            start_time.elapsed()
        );
        Ok(body.to_vec())
    }

    pub async fn get_blog_posts(
        &self,
        blog: &str,
        offset: u64,
        limit: u32,
    ) -> Result<Page, TumblrApiError> {
        let url = self.endpoint_url(&["blog", blog, "posts"]);
        let params = [
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("reblog_info", "true".to_string()),
        ];

        let body = self.make_request(url, &params, blog).await?;
        let page = parse_blog_posts(&body)?;

        info!(
            "Retrieved {} posts from blog {} at offset {}",
            page.posts.len(),
            blog,
            offset
        );
        Ok(page)
    }

    pub async fn get_tagged_posts(
        &self,
        tag: &str,
        before: Option<i64>,
        limit: u32,
    ) -> Result<Page, TumblrApiError> {
        let url = self.endpoint_url(&["tagged"]);
        let mut params = vec![("tag", tag.to_string()), ("limit", limit.to_string())];
        if let Some(before) = before {
            params.push(("before", before.to_string()));
        }

        let body = self.make_request(url, &params, tag).await?;
        let page = parse_tagged_posts(&body)?;

        info!("Retrieved {} posts tagged #{}", page.posts.len(), tag);
        Ok(page)
    }
}

#[async_trait]
impl PostSource for TumblrApiClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, TumblrApiError> {
        match &request.source {
            Source::Blog(blog) => {
                self.get_blog_posts(blog, request.offset, request.page_size)
                    .await
            }
            Source::Tag(tag) => {
                self.get_tagged_posts(tag, request.before, request.page_size)
                    .await
            }
        }
    }
}

/// Map a non-success HTTP status to the matching API error.
pub fn classify_status(
    status: StatusCode,
    retry_after: Option<&str>,
    endpoint: &str,
    source_name: &str,
) -> Option<TumblrApiError> {
    if status.is_success() {
        return None;
    }

    let error = match status {
        StatusCode::UNAUTHORIZED => TumblrApiError::AuthenticationFailed {
            reason: format!("HTTP {} from {}", status.as_u16(), endpoint),
        },
        StatusCode::FORBIDDEN => TumblrApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        StatusCode::NOT_FOUND => TumblrApiError::SourceNotFound {
            source_name: source_name.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = retry_after
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!("Rate limited, retry after {} seconds", retry_after);
            TumblrApiError::RateLimitExceeded { retry_after }
        }
        status if status.is_server_error() => TumblrApiError::ServerError {
            status_code: status.as_u16(),
        },
        status => TumblrApiError::UnexpectedStatus {
            status_code: status.as_u16(),
        },
    };

    Some(error)
}

pub fn classify_transport_error(error: &reqwest::Error) -> TumblrApiError {
    if error.is_timeout() {
        TumblrApiError::RequestTimeout
    } else {
        TumblrApiError::Network {
            details: error.to_string(),
        }
    }
}

pub fn parse_blog_posts(body: &[u8]) -> Result<Page, TumblrApiError> {
    let envelope: TumblrEnvelope<BlogPostsResponse> =
        serde_json::from_slice(body).map_err(|e| {
            error!("Failed to parse blog posts: {}", e);
            TumblrApiError::InvalidResponse {
                details: format!("Failed to parse blog posts: {}", e),
            }
        })?;

    debug!(
        "Blog posts response meta: {} {}",
        envelope.meta.status, envelope.meta.msg
    );

    let page = Page::new(envelope.response.posts);
    Ok(match envelope.response.total_posts {
        Some(total) => page.with_total(total),
        None => page,
    })
}

pub fn parse_tagged_posts(body: &[u8]) -> Result<Page, TumblrApiError> {
    let envelope: TumblrEnvelope<Vec<RawPost>> = serde_json::from_slice(body).map_err(|e| {
        error!("Failed to parse tagged posts: {}", e);
        TumblrApiError::InvalidResponse {
            details: format!("Failed to parse tagged posts: {}", e),
        }
    })?;

    debug!(
        "Tagged posts response meta: {} {}",
        envelope.meta.status, envelope.meta.msg
    );
    Ok(Page::new(envelope.response))
}
