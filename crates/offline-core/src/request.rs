//! Intercepted requests and their cache keys.

use std::fmt;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};

use crate::error::UrlError;

/// The kind of resource a request is fetching.
///
/// Mirrors the fetch `RequestDestination` vocabulary. Only `Document` changes
/// routing; the rest are carried for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level navigation.
    Document,
    Script,
    Style,
    Image,
    Video,
    Audio,
    Font,
    Manifest,
    Worker,
    /// `fetch()` / XHR calls with no specific destination.
    #[default]
    Empty,
}

impl Destination {
    /// Parse a destination name, falling back to `Empty` for unknown values.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "document" => Self::Document,
            "script" => Self::Script,
            "style" => Self::Style,
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "font" => Self::Font,
            "manifest" => Self::Manifest,
            "worker" => Self::Worker,
            _ => Self::Empty,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Document => "document",
            Self::Script => "script",
            Self::Style => "style",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Font => "font",
            Self::Manifest => "manifest",
            Self::Worker => "worker",
            Self::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// An outgoing request intercepted by the router.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Target URL. May be relative until resolved against an origin.
    pub url: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Resource type being fetched.
    pub destination: Destination,
    /// Request body (empty for GET/HEAD).
    pub body: Vec<u8>,
}

impl Request {
    /// Create a request for a URL string.
    ///
    /// Fragments are dropped and characters that are not valid in a URI
    /// (spaces, non-ASCII) are percent-encoded, the way a browser would.
    pub fn new(method: Method, url: &str) -> Result<Self, UrlError> {
        Ok(Self {
            method,
            url: parse_url(url)?,
            headers: HeaderMap::new(),
            destination: Destination::Empty,
            body: Vec::new(),
        })
    }

    /// Create a GET request.
    pub fn get(url: &str) -> Result<Self, UrlError> {
        Self::new(Method::GET, url)
    }

    /// Create a GET request for a top-level document.
    pub fn document(url: &str) -> Result<Self, UrlError> {
        Ok(Self::get(url)?.with_destination(Destination::Document))
    }

    /// Set the destination.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether the method may have a cache entry (GET or HEAD).
    pub fn is_cacheable_method(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    /// Whether the URL carries a scheme and authority.
    pub fn is_absolute(&self) -> bool {
        self.url.scheme().is_some() && self.url.authority().is_some()
    }

    /// Resolve a relative URL against `origin`. Absolute URLs are left alone.
    pub fn resolve(mut self, origin: &Uri) -> Result<Self, UrlError> {
        if self.is_absolute() {
            return Ok(self);
        }

        let path = self
            .url
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");

        let mut builder = Uri::builder().path_and_query(path);
        if let Some(scheme) = origin.scheme() {
            builder = builder.scheme(scheme.clone());
        }
        if let Some(authority) = origin.authority() {
            builder = builder.authority(authority.clone());
        }

        self.url = builder
            .build()
            .map_err(|e| UrlError::new(self.url.to_string(), e.to_string()))?;
        Ok(self)
    }

    /// Host name, lowercased by the URI parser's rules (`None` if relative).
    pub fn host(&self) -> Option<&str> {
        self.url.host()
    }

    /// URL path (always starts with `/`).
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// The URL as a string.
    pub fn url_string(&self) -> String {
        self.url.to_string()
    }

    /// The cache key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Normalized (method, URL) pair identifying a cacheable entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    /// Uppercased method name.
    pub method: String,
    /// Normalized URL.
    pub url: String,
}

impl RequestKey {
    /// Build a key from a method and URL.
    pub fn new(method: &Method, url: &Uri) -> Self {
        Self {
            method: method.as_str().to_ascii_uppercase(),
            url: normalize_url(url),
        }
    }

    /// Whether an entry may be stored under this key.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET" || self.method == "HEAD"
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Normalize a URL for keying: lowercase scheme and host, drop default ports.
pub fn normalize_url(url: &Uri) -> String {
    let path = url.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    let Some(host) = url.host() else {
        return path.to_string();
    };

    let scheme = url.scheme_str().unwrap_or("http").to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    let port = match (url.port_u16(), scheme.as_str()) {
        (None, _) | (Some(80), "http") | (Some(443), "https") => String::new(),
        (Some(port), _) => format!(":{}", port),
    };

    format!("{}://{}{}{}", scheme, host, port, path)
}

/// Parse a URL string the way a browser would accept it.
pub fn parse_url(url: &str) -> Result<Uri, UrlError> {
    let trimmed = url.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);

    if without_fragment.is_empty() {
        return Err(UrlError::new(url, "empty URL"));
    }

    let encoded = percent_encode_invalid(without_fragment);

    // `index.html` or `css/site.css` would otherwise parse as an authority.
    let encoded = if has_scheme(&encoded) || encoded.starts_with('/') {
        encoded
    } else {
        format!("/{}", encoded)
    };

    encoded
        .parse::<Uri>()
        .map_err(|e| UrlError::new(url, e.to_string()))
}

/// Whether `url` starts with `scheme://`.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once(':') else {
        return false;
    };

    rest.starts_with("//")
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn percent_encode_invalid(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for byte in url.bytes() {
        match byte {
            b' ' | b'"' | b'<' | b'>' | b'`' | b'{' | b'}' | b'\\' | b'^' | b'|' => {
                out.push_str(&format!("%{:02X}", byte));
            }
            0x80..=0xFF | 0x00..=0x1F | 0x7F => out.push_str(&format!("%{:02X}", byte)),
            _ => out.push(byte as char),
        }
    }
    out
}
