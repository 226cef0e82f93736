use thiserror::Error;

use crate::oauth2::TokenError;
use crate::transport::{HttpError, format_http_error};

/// Errors produced by [`FreshBooksClient`](crate::FreshBooksClient).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network, TLS, timeout or body-limit failure talking to the API.
    #[error("{0}")]
    Transport(String),

    /// The API answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        status: http::StatusCode,
        endpoint: &'static str,
    },

    /// The response body did not match the expected JSON shape.
    ///
    /// Not retriable: the same payload fails the same way.
    #[error("failed to decode {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// No usable access token could be obtained.
    #[error("authentication failed: {0}")]
    Auth(#[source] TokenError),

    /// The authenticated user belongs to no business.
    #[error("business ID not found")]
    TenantNotFound,

    /// Neither a token nor a complete refresh-token triple was supplied, or
    /// another setting is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// A request URL could not be composed from the base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Map a transport error raised while calling `endpoint`.
    pub(crate) fn from_http(endpoint: &'static str, err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => Self::Cancelled,
            HttpError::HttpStatus { status, .. } => Self::Status { status, endpoint },
            HttpError::Json(source) => Self::Decode {
                what: endpoint,
                source,
            },
            other => Self::Transport(format_http_error(&other, endpoint)),
        }
    }
}

impl From<TokenError> for ClientError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Cancelled => Self::Cancelled,
            other => Self::Auth(other),
        }
    }
}
