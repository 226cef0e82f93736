use std::time::{Duration, Instant};

use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use super::config::RefreshTokenConfig;
use super::error::TokenError;
use super::types::TokenResponse;
use crate::secret::SecretString;
use crate::transport::{HttpClient, HttpError, format_http_error};

/// Access token issued by the token endpoint, with its reuse deadline.
#[derive(Debug, Clone)]
pub(crate) struct IssuedToken {
    pub access_token: SecretString,
    /// `None` when the endpoint sent no `expires_in`: the token is reused
    /// until a request is rejected with 401.
    pub expires_at: Option<Instant>,
}

impl IssuedToken {
    /// `true` while `now + skew` is still before the expiry.
    pub fn is_fresh(&self, skew: Duration) -> bool {
        match self.expires_at {
            None => true,
            Some(at) => at
                .checked_sub(skew)
                .is_some_and(|deadline| Instant::now() < deadline),
        }
    }
}

/// Exchanges a refresh token for an access token.
///
/// Holds the current refresh token, which rotates on every successful
/// exchange when the endpoint returns a new one. Callers serialize access
/// (the token manager keeps it behind an async mutex).
pub(crate) struct RefreshTokenSource {
    client: HttpClient,
    token_endpoint: Url,
    client_id: String,
    client_secret: SecretString,
    refresh_token: SecretString,
}

impl RefreshTokenSource {
    pub fn new(client: HttpClient, config: RefreshTokenConfig) -> Self {
        Self {
            client,
            token_endpoint: config.token_endpoint,
            client_id: config.client_id,
            client_secret: config.client_secret,
            refresh_token: config.refresh_token,
        }
    }

    /// Perform one refresh-token grant.
    pub async fn exchange(&mut self) -> Result<IssuedToken, TokenError> {
        // Scrub the plaintext copies once the request has been encoded.
        let refresh = Zeroizing::new(self.refresh_token.expose().to_owned());
        let secret = Zeroizing::new(self.client_secret.expose().to_owned());
        let fields = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", secret.as_str()),
        ];

        let response = self
            .client
            .post(self.token_endpoint.as_str())
            .header("accept", "application/json")
            .form(&fields)
            .map_err(map_http_error)?
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()
            .map_err(map_http_error)?;

        let token_resp: TokenResponse = response
            .json()
            .map_err(|e| TokenError::InvalidResponse(e.to_string()))?;

        if let Some(ref tt) = token_resp.token_type
            && !tt.eq_ignore_ascii_case("bearer")
        {
            return Err(TokenError::UnsupportedTokenType(tt.clone()));
        }

        if token_resp.access_token.is_empty() {
            return Err(TokenError::InvalidResponse(
                "empty access_token".to_owned(),
            ));
        }

        if let Some(rotated) = token_resp.refresh_token.filter(|rt| !rt.is_empty()) {
            debug!("refresh token rotated by token endpoint");
            self.refresh_token = SecretString::new(rotated);
        }

        let expires_at = token_resp
            .expires_in
            .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));

        Ok(IssuedToken {
            access_token: SecretString::new(token_resp.access_token),
            expires_at,
        })
    }
}

fn map_http_error(e: HttpError) -> TokenError {
    match e {
        HttpError::Cancelled => TokenError::Cancelled,
        other => TokenError::Http(format_http_error(&other, "OAuth2 token")),
    }
}
