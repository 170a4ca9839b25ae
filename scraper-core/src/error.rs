use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Tumblr API error: {0}")]
    TumblrApi(#[from] TumblrApiError),

    #[error("Malformed post record: {0}")]
    MalformedRecord(#[from] MalformedRecordError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Failures of a single page fetch against the Tumblr API.
///
/// Whether a variant is worth retrying is decided by `ErrorExt::is_retryable`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TumblrApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Source not found: {source_name}")]
    SourceNotFound { source_name: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Network failure: {details}")]
    Network { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Unexpected response status: {status_code}")]
    UnexpectedStatus { status_code: u16 },

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedRecordError {
    #[error("record has no identifier")]
    MissingId,

    #[error("record identifier is not usable: {value}")]
    InvalidId { value: String },

    #[error("record is not a JSON object")]
    NotAnObject,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Could not read configuration file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
