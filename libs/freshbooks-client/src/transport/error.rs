use std::time::Duration;
use thiserror::Error;

/// HTTP transport error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// URL could not be converted into a request URI
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri { url: String, reason: String },

    /// Request attempt timed out
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the operation while the request was in flight
    #[error("Request cancelled")]
    Cancelled,

    /// Transport error (network, connection, etc)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body exceeded size limit
    #[error("Response body too large: limit {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// HTTP non-2xx status
    #[error("HTTP {status}: {body_preview}")]
    HttpStatus {
        status: http::StatusCode,
        body_preview: String,
    },

    /// JSON parsing error
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Form URL encoding error
    #[error("Form encoding failed: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

/// Format an [`HttpError`] into a message with a context prefix.
///
/// `HttpStatus` errors carry only the status code; the response body is left
/// out so upstream diagnostics cannot leak into logs.
#[must_use]
pub fn format_http_error(e: &HttpError, prefix: &str) -> String {
    match e {
        HttpError::HttpStatus { status, .. } => format!("{prefix} HTTP {status}"),
        HttpError::Json(err) => format!("{prefix} JSON parse failed: {err}"),
        HttpError::Timeout(duration) => {
            format!("{prefix} request timed out after {duration:?}")
        }
        HttpError::Cancelled => format!("{prefix} request cancelled"),
        HttpError::Transport(err) => format!("{prefix} transport error: {err}"),
        HttpError::Tls(err) => format!("{prefix} TLS error: {err}"),
        HttpError::BodyTooLarge { limit } => {
            format!("{prefix} response too large: limit {limit} bytes")
        }
        HttpError::RequestBuild(err) => format!("{prefix} request build failed: {err}"),
        HttpError::FormEncode(err) => format!("{prefix} form encode error: {err}"),
        HttpError::InvalidUri { url, reason } => {
            format!("{prefix} invalid URL '{url}': {reason}")
        }
    }
}
