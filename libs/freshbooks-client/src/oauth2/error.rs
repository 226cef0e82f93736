use thiserror::Error;

/// Errors returned while obtaining an access token.
///
/// Variants never carry secret values (refresh token, client secret, access
/// tokens) in their formatted output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// HTTP transport or status error during the token exchange.
    ///
    /// The inner string comes from
    /// [`format_http_error`](crate::transport::format_http_error).
    #[error("{0}")]
    Http(String),

    /// The token endpoint returned an unparseable or incomplete response.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The token endpoint returned a `token_type` that is not `Bearer`.
    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),

    /// The exchange was aborted by the caller's cancellation token.
    #[error("token exchange cancelled")]
    Cancelled,
}
