use bytes::Bytes;
use http::Request;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http_body_util::Full;

use super::HttpClient;
use super::error::HttpError;
use super::response::HttpResponse;

/// HTTP request builder with fluent API
///
/// Created by [`HttpClient::get`] and [`HttpClient::post`]. Header errors are
/// captured while building and reported by [`send()`](RequestBuilder::send).
///
/// Query parameters are not composed here; build the URL with `url::Url`
/// and pass the final string.
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    client: HttpClient,
    method: http::Method,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Option<(Bytes, &'static str)>,
    /// Error captured during building (deferred to `send()`)
    error: Option<HttpError>,
}

impl RequestBuilder {
    pub(crate) fn new(client: HttpClient, method: http::Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: Vec::new(),
            body: None,
            error: None,
        }
    }

    /// Add a single header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(mut value)) => {
                if name == http::header::AUTHORIZATION {
                    value.set_sensitive(true);
                }
                self.headers.push((name, value));
            }
            (Err(e), _) => {
                self.error = Some(HttpError::RequestBuild(e.into()));
            }
            (_, Err(e)) => {
                self.error = Some(HttpError::RequestBuild(e.into()));
            }
        }
        self
    }

    /// Set request body as form URL-encoded
    ///
    /// Sets Content-Type to `application/x-www-form-urlencoded` unless a
    /// Content-Type header was already provided.
    ///
    /// # Errors
    ///
    /// Returns `Err(HttpError::FormEncode)` if encoding fails.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let form_string = serde_urlencoded::to_string(fields)?;
        self.body = Some((
            Bytes::from(form_string),
            "application/x-www-form-urlencoded",
        ));
        Ok(self)
    }

    /// Send the request and buffer the response.
    ///
    /// Returns `Ok` for every HTTP status; use
    /// [`HttpResponse::error_for_status`] to reject non-2xx responses.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` if:
    /// - request building failed (invalid headers or URL)
    /// - network/transport error
    /// - the configured request timeout elapsed
    /// - the client's cancellation token fired
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri: http::Uri =
            self.url
                .parse()
                .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
                    url: self.url.clone(),
                    reason: e.to_string(),
                })?;

        let mut builder = Request::builder().method(self.method).uri(uri);

        let has_content_type = self.headers.iter().any(|(name, _)| name == CONTENT_TYPE);
        let body = match self.body {
            Some((bytes, default_content_type)) => {
                if !has_content_type {
                    builder = builder.header(CONTENT_TYPE, default_content_type);
                }
                bytes
            }
            None => Bytes::new(),
        };

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        let request = builder.body(Full::new(body))?;
        self.client.execute(request).await
    }
}
