use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use super::error::HttpError;

/// Maximum number of body bytes copied into an `HttpStatus` error preview.
const ERROR_BODY_PREVIEW_LIMIT: usize = 256;

/// Fully buffered HTTP response.
///
/// The body is read inside the cancellable section of
/// [`RequestBuilder::send`](super::RequestBuilder::send), so a response that
/// reaches the caller never blocks on further network I/O.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl HttpResponse {
    /// Get the response status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Check status and return an error for non-2xx responses.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::HttpStatus` with a truncated body preview if the
    /// status is not 2xx.
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.status.is_success() {
            return Ok(self);
        }

        let end = self.body.len().min(ERROR_BODY_PREVIEW_LIMIT);
        let body_preview = String::from_utf8_lossy(&self.body[..end]).into_owned();
        Err(HttpError::HttpStatus {
            status: self.status,
            body_preview,
        })
    }

    /// Parse the body as JSON without a status check.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Json` if parsing fails.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn response(status: StatusCode, body: &'static str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn error_for_status_passes_success() {
        let resp = response(StatusCode::OK, "{}");
        assert!(resp.error_for_status().is_ok());
    }

    #[test]
    fn error_for_status_truncates_preview() {
        let long = "x".repeat(1000);
        let resp = HttpResponse {
            status: StatusCode::BAD_GATEWAY,
            headers: HeaderMap::new(),
            body: Bytes::from(long),
        };
        match resp.error_for_status() {
            Err(HttpError::HttpStatus {
                status,
                body_preview,
            }) => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body_preview.len(), ERROR_BODY_PREVIEW_LIMIT);
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[test]
    fn json_reports_malformed_body() {
        let resp = response(StatusCode::OK, "{not json");
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, HttpError::Json(_)));
    }
}
