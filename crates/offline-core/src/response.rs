//! Responses returned to the intercepted caller.

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

/// How much of a response the caller is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin response.
    #[default]
    Basic,
    /// Cross-origin response with CORS headers.
    Cors,
    /// Cross-origin response whose status and body cannot be inspected.
    Opaque,
}

/// An HTTP response.
///
/// `Clone` produces the independent copy that is written to the store while
/// the original goes back to the caller.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Vec<u8>,
    /// Response visibility.
    pub kind: ResponseKind,
    /// Final URL after redirects, if known.
    pub url: Option<String>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
            url: None,
        }
    }

    /// Create a 200 response.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Create an opaque response. Browsers report these with status 0; here the
    /// status is kept but `is_ok` is always false.
    pub fn opaque() -> Self {
        Self::new(StatusCode::OK, Vec::new()).with_kind(ResponseKind::Opaque)
    }

    /// Add a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the response kind.
    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the final URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Check if the response is usable as a success (2xx and not opaque).
    pub fn is_ok(&self) -> bool {
        self.status.is_success() && self.kind != ResponseKind::Opaque
    }

    /// Check if the response is opaque.
    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseKind::Opaque
    }

    /// Get the response body as text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Get a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ok() {
        assert!(Response::ok("x").is_ok());
        assert!(Response::new(StatusCode::NO_CONTENT, "").is_ok());
        assert!(!Response::new(StatusCode::NOT_FOUND, "").is_ok());
        assert!(!Response::new(StatusCode::BAD_GATEWAY, "").is_ok());
        assert!(!Response::opaque().is_ok());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Response::ok("hello");
        let mut copy = original.clone();
        copy.body.clear();
        assert_eq!(original.text(), "hello");
    }

    #[test]
    fn test_headers() {
        let resp = Response::ok("<html></html>")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert_eq!(resp.header("etag"), None);
    }
}
