use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ClientError;
use crate::oauth2::RefreshPolicy;
use crate::secret::SecretString;

/// Default API root; `oauth/token` and `api/v1/...` are resolved against it.
pub const DEFAULT_BASE_URL: &str = "https://api.freshbooks.com/auth/";

/// How the client authenticates.
#[derive(Clone)]
pub enum Credentials {
    /// Long-lived bearer token, used as-is.
    Static { access_token: SecretString },
    /// Refresh token exchanged for short-lived access tokens.
    Refreshable {
        refresh_token: SecretString,
        client_id: String,
        client_secret: SecretString,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static { .. } => f
                .debug_struct("Static")
                .field("access_token", &"[REDACTED]")
                .finish(),
            Self::Refreshable { client_id, .. } => f
                .debug_struct("Refreshable")
                .field("refresh_token", &"[REDACTED]")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
        }
    }
}

impl Credentials {
    /// Pick credentials from optional configuration values.
    ///
    /// A non-empty `token` wins. Otherwise all of `refresh_token`,
    /// `client_id` and `client_secret` are required. Client id and secret
    /// must always come as a pair.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] when neither form is complete
    /// or only one of client id / client secret is set.
    pub fn from_parts(
        token: Option<&str>,
        refresh_token: Option<&str>,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<Self, ClientError> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }

        let token = present(token);
        let refresh_token = present(refresh_token);
        let client_id = present(client_id);
        let client_secret = present(client_secret);

        if client_id.is_some() != client_secret.is_some() {
            return Err(ClientError::Configuration(
                "fb-client-id and fb-client-secret must be provided together".to_owned(),
            ));
        }

        if let Some(token) = token {
            return Ok(Self::Static {
                access_token: SecretString::new(token),
            });
        }

        match (refresh_token, client_id, client_secret) {
            (Some(refresh_token), Some(client_id), Some(client_secret)) => Ok(Self::Refreshable {
                refresh_token: SecretString::new(refresh_token),
                client_id: client_id.to_owned(),
                client_secret: SecretString::new(client_secret),
            }),
            _ => Err(ClientError::Configuration(
                "[token] or [refresh-token, fb-client-id, fb-client-secret] must be provided"
                    .to_owned(),
            )),
        }
    }
}

/// Non-credential client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, normally [`DEFAULT_BASE_URL`]. Must end with `/`.
    pub base_url: Url,

    /// Per-request timeout. `None` bounds requests only by cancellation.
    pub request_timeout: Option<Duration>,

    /// When a cached access token stops being reused.
    pub refresh: RefreshPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: None,
            refresh: RefreshPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Config rooted at `base_url`; a missing trailing `/` is added so
    /// relative endpoints resolve beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(base_url: &str) -> Result<Self, ClientError> {
        let mut url = Url::parse(base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self {
            base_url: url,
            ..Self::default()
        })
    }
}

#[allow(clippy::unwrap_used)]
fn default_base_url() -> Url {
    // Constant input; parsing cannot fail.
    Url::parse(DEFAULT_BASE_URL).unwrap()
}
