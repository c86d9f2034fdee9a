//! Stored response snapshots.

use chrono::{DateTime, Utc};
use offline_core::{HeaderMap, HeaderName, HeaderValue, RequestKey, Response, ResponseKind, StatusCode};
use serde::{Deserialize, Serialize};

/// A response as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers (non-UTF-8 values are dropped).
    pub headers: Vec<(String, String)>,
    /// Response body.
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
    /// Response visibility at the time it was stored.
    pub kind: ResponseKind,
    /// Final URL, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Snapshot a response for storage.
    pub fn from_response(response: &Response) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            status: response.status.as_u16(),
            headers,
            body: response.body.clone(),
            kind: response.kind,
            url: response.url.clone(),
            stored_at: Utc::now(),
        }
    }

    /// Rebuild a response from the snapshot.
    pub fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }

        Response {
            status: StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK),
            headers,
            body: self.body,
            kind: self.kind,
            url: self.url,
        }
    }

    /// Age of the entry in seconds.
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.stored_at).num_seconds().max(0)
    }
}

/// A keyed entry, as persisted by file-backed stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request key.
    pub key: RequestKey,
    /// Stored response.
    pub response: CachedResponse,
}

mod body_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
