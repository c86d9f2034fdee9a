//! HTTP transport backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use offline_core::{HeaderValue, Request, Response, ResponseKind, Uri};
use reqwest::header::{CACHE_CONTROL, PRAGMA};

use crate::error::FetchError;
use crate::transport::{CacheMode, FetchOptions, Transport};

/// Transport that performs real HTTP requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    origin: Option<Uri>,
}

impl ReqwestTransport {
    /// Create a transport with a default client.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a transport whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("offline-router/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            origin: None,
        })
    }

    /// Set the origin used to tell same-origin responses from cross-origin ones.
    pub fn with_origin(mut self, origin: Uri) -> Self {
        self.origin = Some(origin);
        self
    }

    fn kind_for(&self, request: &Request) -> ResponseKind {
        let Some(origin) = &self.origin else {
            return ResponseKind::Basic;
        };

        let same_origin = request.url.scheme_str() == origin.scheme_str()
            && request.url.authority() == origin.authority();

        if same_origin {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: &Request, options: FetchOptions) -> Result<Response, FetchError> {
        if !request.is_absolute() {
            return Err(FetchError::InvalidRequest(format!(
                "relative URL {}",
                request.url
            )));
        }

        let mut builder = self
            .client
            .request(request.method.clone(), request.url_string())
            .headers(request.headers.clone());

        if options.cache == CacheMode::NoStore {
            builder = builder
                .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
                .header(PRAGMA, HeaderValue::from_static("no-cache"));
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

        let mut out = Response::new(status, body)
            .with_kind(self.kind_for(request))
            .with_url(url);
        out.headers = headers;
        Ok(out)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_builder() {
        FetchError::InvalidRequest(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}
