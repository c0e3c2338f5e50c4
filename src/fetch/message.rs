//! Request and response values that cross the intercepted network boundary.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use serde_json::Value;
use url::Url;

/// Base used to resolve same-origin relative URLs.
const RELATIVE_BASE: &str = "http://origin.invalid/";

// == Fetch Request ==
/// An outbound request as seen by the interceptor.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    /// Absolute URL or same-origin path (`/api/deliveries/5?page=2`)
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Builds a POST carrying a JSON document.
    pub fn post_json(url: impl Into<String>, payload: &Value) -> Self {
        let mut request = Self::new(Method::POST, url);
        request.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        request.body = Bytes::from(payload.to_string());
        request
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// True for top-level document loads, which get the offline page as a fallback.
    pub fn is_navigation(&self) -> bool {
        if !self.is_get() {
            return false;
        }
        let header_str = |name: &str| {
            self.headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
        };
        header_str("sec-fetch-mode").eq_ignore_ascii_case("navigate")
            || header_str("accept").contains("text/html")
    }

    /// Path component used for route classification.
    pub fn path(&self) -> String {
        match parse_url(&self.url) {
            Some(url) => url.path().to_string(),
            None => self
                .url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Parses an absolute URL or resolves a relative one against a placeholder origin.
pub fn parse_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .or_else(|_| Url::parse(RELATIVE_BASE).and_then(|base| base.join(raw)))
        .ok()
}

/// Returns the normalized identity of a URL: fragment dropped, query kept,
/// same-origin relative URLs reduced to path + query.
pub fn normalize_url(raw: &str) -> String {
    let Some(mut url) = parse_url(raw) else {
        return raw.trim().to_string();
    };
    url.set_fragment(None);

    if url.host_str() == Some("origin.invalid") && !raw.starts_with(RELATIVE_BASE) {
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    } else {
        url.to_string()
    }
}

// == Response Source ==
/// Where the interceptor obtained a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// Synthesized offline response (placeholder, offline page, 503)
    Fallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Fallback => "fallback",
        }
    }
}

// == Fetch Response ==
/// A response returned to the caller of the interceptor.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl FetchResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            source: ResponseSource::Network,
        }
    }

    pub fn json(status: StatusCode, payload: &Value) -> Self {
        Self::new(status, payload.to_string()).with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parses the body as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}
