use serde::Deserialize;

/// Deserialized response of the refresh-token grant.
///
/// `Deserialize`-only so access and refresh tokens cannot be serialized
/// back out into logs by accident. Unknown fields (`scope`, `created_at`,
/// ...) are ignored.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds (optional per RFC 6749).
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Must be "Bearer" (any case) when present.
    #[serde(default)]
    pub token_type: Option<String>,
    /// The upstream rotates refresh tokens; a new one replaces the old.
    #[serde(default)]
    pub refresh_token: Option<String>,
}
