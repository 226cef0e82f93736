use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;

use super::config::{RefreshPolicy, RefreshTokenConfig};
use super::error::TokenError;
use super::source::{IssuedToken, RefreshTokenSource};
use crate::secret::SecretString;
use crate::transport::HttpClient;

/// Source of the bearer token attached to every API request.
///
/// A static token is returned as-is forever. A refreshable credential keeps
/// the last issued access token in an `ArcSwapOption`, so reads of a fresh
/// token never lock; an expired or missing token is replaced by exactly one
/// exchange, with concurrent callers waiting on the source mutex and picking
/// up the result.
pub struct TokenManager {
    kind: Kind,
}

enum Kind {
    Static(SecretString),
    Refreshable(RefreshingToken),
}

struct RefreshingToken {
    cached: ArcSwapOption<IssuedToken>,
    source: Mutex<RefreshTokenSource>,
    policy: RefreshPolicy,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.kind {
            Kind::Static(_) => "static",
            Kind::Refreshable(_) => "refreshable",
        };
        f.debug_struct("TokenManager")
            .field("mode", &mode)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Token manager for a long-lived access token.
    #[must_use]
    pub fn fixed(access_token: SecretString) -> Self {
        Self {
            kind: Kind::Static(access_token),
        }
    }

    /// Token manager that exchanges a refresh token on first use and
    /// whenever the cached access token is about to expire.
    ///
    /// No network call happens here.
    #[must_use]
    pub fn refreshable(http: HttpClient, config: RefreshTokenConfig) -> Self {
        let policy = config.policy;
        Self {
            kind: Kind::Refreshable(RefreshingToken {
                cached: ArcSwapOption::empty(),
                source: Mutex::new(RefreshTokenSource::new(http, config)),
                policy,
            }),
        }
    }

    /// `true` when backed by a refresh-token credential.
    #[must_use]
    pub fn is_refreshable(&self) -> bool {
        matches!(self.kind, Kind::Refreshable(_))
    }

    /// Return a usable access token.
    ///
    /// # Errors
    ///
    /// Static tokens never fail. A refreshable credential returns
    /// [`TokenError`] when the exchange fails; nothing is cached in that
    /// case, so the next call tries again.
    pub async fn token(&self) -> Result<SecretString, TokenError> {
        match &self.kind {
            Kind::Static(token) => Ok(token.clone()),
            Kind::Refreshable(refreshing) => refreshing.token().await,
        }
    }

    /// Drop the cached access token after the API rejected it.
    ///
    /// The next [`token`](Self::token) call performs a fresh exchange.
    /// No-op for static tokens.
    pub fn invalidate(&self) {
        if let Kind::Refreshable(refreshing) = &self.kind {
            refreshing.cached.store(None);
            tracing::debug!("cached access token invalidated");
        }
    }
}

impl RefreshingToken {
    fn fresh(&self) -> Option<SecretString> {
        let guard = self.cached.load();
        guard
            .as_deref()
            .filter(|issued| issued.is_fresh(self.policy.expiry_skew))
            .map(|issued| issued.access_token.clone())
    }

    async fn token(&self) -> Result<SecretString, TokenError> {
        if let Some(token) = self.fresh() {
            return Ok(token);
        }

        let mut source = self.source.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = self.fresh() {
            return Ok(token);
        }

        let issued = source.exchange().await?;
        tracing::info!(
            expires = issued.expires_at.is_some(),
            "obtained access token from refresh-token grant"
        );
        let token = issued.access_token.clone();
        self.cached.store(Some(Arc::new(issued)));
        Ok(token)
    }
}
