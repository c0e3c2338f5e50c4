//! Network boundary
//!
//! The [`Network`] trait is the only way the engine reaches the origin server.
//! [`HttpNetwork`] implements it with reqwest; tests substitute scripted doubles.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::header;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::message::{FetchRequest, FetchResponse, ResponseSource};

// == Network Error ==
/// Failure to obtain any response from the origin.
///
/// A response with an error status is not a `NetworkError`; it is a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// No connectivity, DNS failure, connection reset
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Request could not be built (bad URL, bad header)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

// == Network Trait ==
#[async_trait]
pub trait Network: Send + Sync {
    /// Sends the request and returns whatever the origin answered.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, NetworkError>;
}

// == HTTP Network ==
/// reqwest-backed network that resolves relative URLs against a fixed origin.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
    origin: Url,
    timeout: Duration,
}

impl HttpNetwork {
    /// Creates a client for `origin` with a per-request timeout.
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let origin = Url::parse(origin)
            .map_err(|e| NetworkError::InvalidRequest(format!("origin {}: {}", origin, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            origin,
            timeout,
        })
    }

    fn resolve(&self, raw: &str) -> Result<Url, NetworkError> {
        Url::parse(raw)
            .or_else(|_| self.origin.join(raw))
            .map_err(|e| NetworkError::InvalidRequest(format!("{}: {}", raw, e)))
    }

    fn classify(&self, err: reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout(self.timeout)
        } else {
            NetworkError::Unreachable(err.to_string())
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, NetworkError> {
        let target = self.resolve(&request.url)?;

        let mut headers = request.headers.clone();
        headers.remove(header::HOST);

        debug!("{} {}", request.method, target);
        let response = self
            .client
            .request(request.method.clone(), target)
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        // Body is fully buffered before the response exists, so an abandoned
        // fetch never yields a partial entry.
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        Ok(FetchResponse {
            status,
            headers,
            body,
            source: ResponseSource::Network,
        })
    }
}
