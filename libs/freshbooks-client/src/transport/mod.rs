//! Minimal hyper-based HTTP transport.
//!
//! Provides exactly what the FreshBooks API access layer needs: authenticated
//! GETs, a form-encoded POST for the token endpoint, rustls TLS, a body size
//! cap, optional per-request timeout and cooperative cancellation through a
//! [`CancellationToken`]. No retries are performed here; retry policy belongs
//! to the sync driver.

mod error;
mod request;
mod response;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tokio_util::sync::CancellationToken;

pub use error::{HttpError, format_http_error};
pub use request::RequestBuilder;
pub use response::HttpResponse;

/// Default response body cap (10 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// HTTP client shared by the token source and the API client.
///
/// `HttpClient` is `Clone + Send + Sync`; clones share the connection pool
/// and the cancellation token.
#[derive(Clone)]
pub struct HttpClient {
    inner: HyperClient,
    cancel: CancellationToken,
    request_timeout: Option<Duration>,
    max_body_size: usize,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("request_timeout", &self.request_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a builder for configuring the HTTP client
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create a GET request builder
    pub fn get(&self, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), http::Method::GET, url.to_owned())
    }

    /// Create a POST request builder
    pub fn post(&self, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), http::Method::POST, url.to_owned())
    }

    /// Cancellation token observed by every request of this client.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run a request, racing it against cancellation.
    ///
    /// Dropping the losing future aborts the in-flight hyper call.
    async fn execute(&self, request: Request<Full<Bytes>>) -> Result<HttpResponse, HttpError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(HttpError::Cancelled),
            result = self.execute_with_timeout(request) => result,
        }
    }

    async fn execute_with_timeout(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<HttpResponse, HttpError> {
        match self.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.round_trip(request))
                .await
                .map_err(|_| HttpError::Timeout(timeout))?,
            None => self.round_trip(request).await,
        }
    }

    async fn round_trip(&self, request: Request<Full<Bytes>>) -> Result<HttpResponse, HttpError> {
        let response = self.inner.request(request).await?;
        let (parts, body) = response.into_parts();

        let limit = self.max_body_size;
        let collected = Limited::new(body, limit).collect().await.map_err(|e| {
            if e.is::<http_body_util::LengthLimitError>() {
                HttpError::BodyTooLarge { limit }
            } else {
                HttpError::Transport(e)
            }
        })?;

        Ok(HttpResponse {
            status: parts.status,
            headers: parts.headers,
            body: collected.to_bytes(),
        })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    request_timeout: Option<Duration>,
    max_body_size: usize,
    cancel: Option<CancellationToken>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            request_timeout: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            cancel: None,
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout. `None` (the default) leaves requests bounded only
    /// by cancellation.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Maximum buffered response body size.
    #[must_use]
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Token whose cancellation aborts every in-flight and future request.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the client.
    ///
    /// Plain `http://` URLs are accepted so the client can be pointed at a
    /// local mock server; production base URLs are `https://`.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Tls` if the TLS configuration cannot be created.
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let provider = rustls::crypto::CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()));

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(provider)
            .map_err(|e| HttpError::Tls(Box::new(e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let inner = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(https);

        Ok(HttpClient {
            inner,
            cancel: self.cancel.unwrap_or_default(),
            request_timeout: self.request_timeout,
            max_body_size: self.max_body_size,
        })
    }
}
