//! Cache Entry Module
//!
//! Request identity keys and the stored form of a response.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;

use crate::fetch::{normalize_url, FetchRequest, FetchResponse, ResponseSource};

// == Request Key ==
/// Normalized request identity: method plus URL, query string significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(method: &Method, url: &str) -> Self {
        Self(format!("{} {}", method, normalize_url(url)))
    }

    pub fn for_request(request: &FetchRequest) -> Self {
        Self::new(&request.method, &request.url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Cache Entry ==
/// A stored response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: RequestKey,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
}

impl CacheEntry {
    /// Captures a response for storage under `key`.
    pub fn from_response(key: RequestKey, response: &FetchResponse) -> Self {
        Self {
            key,
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at: current_timestamp_ms(),
        }
    }

    /// Rebuilds the response this entry was captured from.
    pub fn to_response(&self) -> FetchResponse {
        FetchResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            source: ResponseSource::Cache,
        }
    }

    /// Approximate storage footprint, checked against the per-entry quota.
    pub fn size_bytes(&self) -> usize {
        let header_bytes: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        self.body.len() + header_bytes
    }
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[test]
    fn test_key_includes_method() {
        let get = RequestKey::new(&Method::GET, "/api/deliveries/5");
        let post = RequestKey::new(&Method::POST, "/api/deliveries/5");
        assert_eq!(get.as_str(), "GET /api/deliveries/5");
        assert_ne!(get, post);
    }

    #[test]
    fn test_key_ignores_fragment() {
        assert_eq!(
            RequestKey::new(&Method::GET, "/zones#list"),
            RequestKey::new(&Method::GET, "/zones")
        );
    }

    #[test]
    fn test_entry_round_trips_response() {
        let response = FetchResponse::new(StatusCode::OK, "hello").with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        let entry = CacheEntry::from_response(RequestKey::new(&Method::GET, "/x"), &response);
        let restored = entry.to_response();

        assert_eq!(restored.status, StatusCode::OK);
        assert_eq!(restored.body, response.body);
        assert_eq!(restored.headers, response.headers);
        assert_eq!(restored.source, ResponseSource::Cache);
    }

    #[test]
    fn test_size_counts_body_and_headers() {
        let response = FetchResponse::new(StatusCode::OK, vec![0u8; 100])
            .with_header(header::ETAG, HeaderValue::from_static("abc"));
        let entry = CacheEntry::from_response(RequestKey::new(&Method::GET, "/x"), &response);
        assert_eq!(entry.size_bytes(), 100 + "etag".len() + 3);
    }
}
