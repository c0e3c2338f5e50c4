//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use offline_sync::fetch::{FetchRequest, FetchResponse, Network, NetworkError};
use offline_sync::{api::create_router, AppState, Config, OfflineWorker};
use serde_json::Value;
use tower::ServiceExt;

/// In-memory origin: answers from a route table, records every request and
/// can be switched offline.
pub struct MockOrigin {
    online: AtomicBool,
    fail_next: AtomicUsize,
    routes: Mutex<HashMap<String, (StatusCode, Vec<u8>)>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl MockOrigin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            fail_next: AtomicUsize::new(0),
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn respond(&self, method: Method, url: &str, status: StatusCode, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, url), (status, body.as_bytes().to_vec()));
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.url == url).count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for MockOrigin {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, NetworkError> {
        self.calls.lock().unwrap().push(request.clone());

        let forced = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced || !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable("mock origin offline".into()));
        }

        let key = format!("{} {}", request.method, request.url);
        Ok(match self.routes.lock().unwrap().get(&key) {
            Some((status, body)) => FetchResponse::new(*status, body.clone()),
            None => FetchResponse::new(StatusCode::OK, "ok"),
        })
    }
}

pub async fn worker_with(origin: Arc<MockOrigin>, config: Config) -> Arc<OfflineWorker> {
    Arc::new(OfflineWorker::from_config(&config, origin).await.unwrap())
}

pub fn router_for(worker: Arc<OfflineWorker>) -> Router {
    create_router(AppState::from(worker))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_to_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
