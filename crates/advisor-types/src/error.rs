//! Error hierarchy for Advisor.

use thiserror::Error;

/// Top-level error type for Advisor operations.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the chat-completions API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Coarse classification of an API failure, for callers deciding whether to
/// display, retry, or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Auth,
    Quota,
    Malformed,
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Auth { .. } => FailureKind::Auth,
            ApiError::RateLimited { .. } | ApiError::QuotaExceeded { .. } => FailureKind::Quota,
            ApiError::Server { .. } | ApiError::Network(_) | ApiError::Timeout => {
                FailureKind::Network
            }
            ApiError::BadRequest { .. } | ApiError::MalformedResponse(_) => FailureKind::Malformed,
        }
    }
}

/// Errors from turning an uploaded file into text.
///
/// OCR failures never surface here; the extractor folds them into the text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("'{file}' is not valid UTF-8: {source}")]
    Decode {
        file: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Failed to read PDF '{file}': {message}")]
    Pdf { file: String, message: String },

    #[error("Failed to read DOCX '{file}': {message}")]
    Docx { file: String, message: String },
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
