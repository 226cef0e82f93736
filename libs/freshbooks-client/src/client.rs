use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use url::Url;
use zeroize::Zeroizing;

use crate::config::{ClientConfig, Credentials};
use crate::error::ClientError;
use crate::models::{BusinessId, ListResponse, TeamMember};
use crate::oauth2::{RefreshTokenConfig, TokenManager};
use crate::pagination::{self, Page, PageOptions};
use crate::transport::{HttpClient, HttpResponse};

const TOKEN_PATH: &str = "oauth/token";

/// Authenticated, read-only FreshBooks API client.
///
/// Owns the token manager and the lazily resolved business id. Share it
/// behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct FreshBooksClient {
    pub(crate) http: HttpClient,
    pub(crate) tokens: TokenManager,
    pub(crate) base_url: Url,
    pub(crate) business_id: OnceCell<BusinessId>,
}

impl FreshBooksClient {
    #[must_use]
    pub fn builder(credentials: Credentials) -> FreshBooksClientBuilder {
        FreshBooksClientBuilder {
            credentials,
            config: ClientConfig::default(),
            cancel: None,
            business_id: None,
        }
    }

    /// `true` when requests use a refresh-token credential.
    #[must_use]
    pub fn uses_refresh_token(&self) -> bool {
        self.tokens.is_refreshable()
    }

    /// Cancellation token observed by every request of this client.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        self.http.cancellation()
    }

    /// Fetch one page of the business's team members.
    ///
    /// Resolves the business id first if that has not happened yet.
    ///
    /// # Errors
    ///
    /// See [`ClientError`]. Nothing is retried here.
    #[tracing::instrument(
        skip_all,
        fields(page = opts.effective_page(), per_page = opts.effective_per_page())
    )]
    pub async fn list_team_members(
        &self,
        opts: PageOptions,
    ) -> Result<Page<TeamMember>, ClientError> {
        let business_id = self.ensure_business_id().await?;
        let url = self.endpoint(&format!(
            "api/v1/businesses/{}/team_members",
            business_id.as_str()
        ))?;

        let page = self.fetch_page("team_members", url, opts).await?;
        tracing::debug!(
            count = page.items.len(),
            next_page = ?page.next_page,
            "fetched team members page"
        );
        Ok(page)
    }

    /// GET one page of a list endpoint and derive the next cursor.
    pub(crate) async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        mut url: Url,
        opts: PageOptions,
    ) -> Result<Page<T>, ClientError> {
        opts.apply(&mut url);

        let response = self.get(endpoint, &url).await?;
        let body: ListResponse<T> = decode(endpoint, &response)?;
        let next_page = pagination::next_page(response.headers(), &url, body.meta.as_ref());

        Ok(Page {
            items: body.response,
            next_page,
        })
    }

    /// Authenticated GET returning a decoded body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &Url,
    ) -> Result<T, ClientError> {
        let response = self.get(endpoint, url).await?;
        decode(endpoint, &response)
    }

    async fn get(&self, endpoint: &'static str, url: &Url) -> Result<HttpResponse, ClientError> {
        let token = self.tokens.token().await?;
        let authorization = Zeroizing::new(format!("Bearer {}", token.expose()));

        let response = self
            .http
            .get(url.as_str())
            .header("authorization", &authorization)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| ClientError::from_http(endpoint, e))?;

        if response.status() == http::StatusCode::UNAUTHORIZED {
            tracing::warn!(endpoint, "API rejected the access token");
            self.tokens.invalidate();
        }

        response
            .error_for_status()
            .map_err(|e| ClientError::from_http(endpoint, e))
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }
}

fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: &HttpResponse,
) -> Result<T, ClientError> {
    serde_json::from_slice(response.body()).map_err(|source| ClientError::Decode {
        what: endpoint,
        source,
    })
}

/// Builder for [`FreshBooksClient`].
#[derive(Debug)]
pub struct FreshBooksClientBuilder {
    credentials: Credentials,
    config: ClientConfig,
    cancel: Option<CancellationToken>,
    business_id: Option<BusinessId>,
}

impl FreshBooksClientBuilder {
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Token whose cancellation aborts every in-flight and future request.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Use a known business id instead of looking it up.
    #[must_use]
    pub fn business_id(mut self, id: BusinessId) -> Self {
        self.business_id = Some(id);
        self
    }

    /// Build the client. No request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the TLS stack cannot be set up
    /// and [`ClientError::InvalidUrl`] if the token endpoint cannot be
    /// derived from the base URL.
    pub fn build(self) -> Result<FreshBooksClient, ClientError> {
        let mut http = HttpClient::builder().request_timeout(self.config.request_timeout);
        if let Some(cancel) = self.cancel {
            http = http.cancellation(cancel);
        }
        let http = http
            .build()
            .map_err(|e| ClientError::from_http("client setup", e))?;

        let tokens = match self.credentials {
            Credentials::Static { access_token } => TokenManager::fixed(access_token),
            Credentials::Refreshable {
                refresh_token,
                client_id,
                client_secret,
            } => TokenManager::refreshable(
                http.clone(),
                RefreshTokenConfig {
                    token_endpoint: self.config.base_url.join(TOKEN_PATH)?,
                    client_id,
                    client_secret,
                    refresh_token,
                    policy: self.config.refresh,
                },
            ),
        };

        Ok(FreshBooksClient {
            http,
            tokens,
            base_url: self.config.base_url,
            business_id: OnceCell::new_with(self.business_id),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::secret::SecretString;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> FreshBooksClient {
        FreshBooksClient::builder(Credentials::Static {
            access_token: SecretString::new("tok"),
        })
        .config(ClientConfig::with_base_url(&server.url("/auth/")).unwrap())
        .business_id(BusinessId::new("42"))
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn list_sends_auth_and_json_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/auth/api/v1/businesses/42/team_members")
                .query_param("page", "1")
                .query_param("per_page", "50")
                .header("authorization", "Bearer tok")
                .header("accept", "application/json")
                .header("content-type", "application/json");
            then.status(200)
                .json_body(json!({"response": [{"uuid": "u-1", "business_role_name": "owner"}]}));
        });

        let page = client(&server)
            .list_team_members(PageOptions::default())
            .await
            .unwrap();

        mock.assert();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].uuid, "u-1");
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_endpoint() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/auth/api/v1/businesses/42/team_members");
            then.status(503).body("maintenance");
        });

        let err = client(&server)
            .list_team_members(PageOptions::default())
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                ClientError::Status {
                    status: http::StatusCode::SERVICE_UNAVAILABLE,
                    endpoint: "team_members"
                }
            ),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/auth/api/v1/businesses/42/team_members");
            then.status(200).body(r#"{"response": "nope"}"#);
        });

        let err = client(&server)
            .list_team_members(PageOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Decode { what: "team_members", .. }));
    }

    #[test]
    fn token_endpoint_is_derived_from_base_url() {
        let built = FreshBooksClient::builder(Credentials::Refreshable {
            refresh_token: SecretString::new("rt"),
            client_id: "id".into(),
            client_secret: SecretString::new("sec"),
        })
        .build()
        .unwrap();

        assert!(built.uses_refresh_token());
        assert_eq!(
            built.endpoint(TOKEN_PATH).unwrap().as_str(),
            "https://api.freshbooks.com/auth/oauth/token"
        );
    }
}
