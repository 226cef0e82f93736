use std::fmt;
use std::time::Duration;

use url::Url;

use crate::secret::SecretString;

/// When a cached access token stops being reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// A token is treated as expired this long before its real expiry
    /// (default: 10 s).
    pub expiry_skew: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            expiry_skew: Duration::from_secs(10),
        }
    }
}

/// Everything the refresh-token grant needs.
///
/// `Debug` is manually implemented to redact the refresh token and client
/// secret.
#[derive(Clone)]
pub struct RefreshTokenConfig {
    /// Token endpoint (`POST`), e.g. `https://api.freshbooks.com/auth/oauth/token`.
    pub token_endpoint: Url,

    /// `OAuth2` client identifier.
    pub client_id: String,

    /// `OAuth2` client secret.
    pub client_secret: SecretString,

    /// Initial refresh token; replaced whenever the endpoint rotates it.
    pub refresh_token: SecretString,

    /// Reuse policy for issued access tokens.
    pub policy: RefreshPolicy,
}

impl fmt::Debug for RefreshTokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenConfig")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("policy", &self.policy)
            .finish()
    }
}
