use crate::error::*;
use std::time::Duration;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::TumblrApi(e) => {
                error!("Tumblr API error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::TumblrApi(e) => e.is_retryable(),
            CoreError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::TumblrApi(e) => e.retry_after(),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::TumblrApi(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::MalformedRecord(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Io(e) => format!("Could not read or write a file: {}", e),
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::Serialization(_) => "Could not encode the scraped posts.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::TumblrApi(_) => "TUMBLR_API".to_string(),
            CoreError::MalformedRecord(_) => "MALFORMED_RECORD".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
        }
    }
}

impl ErrorExt for TumblrApiError {
    fn log_error(&self) -> &Self {
        error!("TumblrApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("TumblrApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            TumblrApiError::RateLimitExceeded { .. } => true,
            TumblrApiError::RequestTimeout => true,
            TumblrApiError::Network { .. } => true,
            TumblrApiError::ServerError { status_code } => *status_code >= 500,
            TumblrApiError::InvalidResponse { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            TumblrApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            TumblrApiError::AuthenticationFailed { .. } => {
                "Tumblr rejected the API key. Please check TUMBLR_CONSUMER_KEY.".to_string()
            }
            TumblrApiError::Forbidden { resource } => format!(
                "Access denied to {}. The blog may be private or restricted.",
                resource
            ),
            TumblrApiError::SourceNotFound { source_name } => {
                format!("'{}' was not found on Tumblr.", source_name)
            }
            TumblrApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            TumblrApiError::RequestTimeout => {
                "Request to Tumblr timed out. Please try again.".to_string()
            }
            _ => "Tumblr API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            TumblrApiError::AuthenticationFailed { .. } => "TUMBLR_AUTH_FAILED".to_string(),
            TumblrApiError::Forbidden { .. } => "TUMBLR_FORBIDDEN".to_string(),
            TumblrApiError::SourceNotFound { .. } => "TUMBLR_SOURCE_NOT_FOUND".to_string(),
            TumblrApiError::RateLimitExceeded { .. } => "TUMBLR_RATE_LIMIT".to_string(),
            TumblrApiError::RequestTimeout => "TUMBLR_TIMEOUT".to_string(),
            TumblrApiError::Network { .. } => "TUMBLR_NETWORK".to_string(),
            TumblrApiError::ServerError { .. } => "TUMBLR_SERVER_ERROR".to_string(),
            TumblrApiError::UnexpectedStatus { .. } => "TUMBLR_UNEXPECTED_STATUS".to_string(),
            TumblrApiError::InvalidResponse { .. } => "TUMBLR_INVALID_RESPONSE".to_string(),
        }
    }
}

impl ErrorExt for MalformedRecordError {
    fn log_error(&self) -> &Self {
        error!("MalformedRecordError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("MalformedRecordError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        "A post returned by Tumblr could not be read and was skipped.".to_string()
    }

    fn error_code(&self) -> String {
        match self {
            MalformedRecordError::MissingId => "RECORD_MISSING_ID".to_string(),
            MalformedRecordError::InvalidId { .. } => "RECORD_INVALID_ID".to_string(),
            MalformedRecordError::NotAnObject => "RECORD_NOT_OBJECT".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false // Config errors need user intervention
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::ReadFailed { path, .. } => {
                format!("Configuration file '{}' could not be read.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid value '{}' for configuration field '{}'.", value, field)
            }
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::ReadFailed { .. } => "CONFIG_READ_FAILED".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}
