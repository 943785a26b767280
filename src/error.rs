//! Error types for the fetch pipeline and extraction layers.
//!
//! Soft blocks and transient network hiccups are not errors: they are
//! handled inside the fetch state machine (browser fallback, bounded retry)
//! and degrade to an absent result when strict mode is off. Only conditions
//! the caller must act on surface here.

use thiserror::Error;

/// All errors surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// No URL was given and the session has no base URL configured.
    #[error("no URL to fetch: none given and no base URL configured")]
    NoUrl,

    /// Invalid caller input (zero pages, empty form fields, bad header name, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A CSS selector failed to parse.
    #[error("invalid selector `{0}`")]
    Selector(String),

    /// Transport failure that exhausted the retry budget in strict mode.
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        source: TransportError,
    },

    /// Non-2xx response in strict mode.
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Headless browser launch, navigation, or capture failure.
    #[error("browser error: {0}")]
    Browser(String),

    /// A response body could not be parsed as JSON.
    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },

    /// HTTP client construction failure.
    #[error("http client: {0}")]
    Client(String),

    /// Filesystem failure during download or export.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV serialization failure during export.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level failure, classified so the fetch state machine can tell
/// retryable conditions apart from everything else.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("malformed response: {0}")]
    Decode(String),

    /// Non-success status reported by an operation that demands 2xx
    /// (downloads). The GET classification path never produces this.
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("io error: {0}")]
    Io(String),

    #[error("transport failure: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_url() {
        let err = Error::Status {
            status: 404,
            url: "https://example.com/missing".into(),
        };
        assert_eq!(err.to_string(), "HTTP status 404 for https://example.com/missing");
    }

    #[test]
    fn transport_error_keeps_classification() {
        let err = TransportError::Timeout("deadline elapsed".into());
        assert!(err.to_string().contains("timed out"));
    }
}
