//! Scripted network double shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};

use crate::fetch::{FetchRequest, FetchResponse, Network, NetworkError};

/// Network that answers from a script and records every request.
///
/// Unscripted requests succeed with `200 ok` while online.
pub struct ScriptedNetwork {
    online: AtomicBool,
    fail_next: AtomicUsize,
    routes: Mutex<HashMap<String, (StatusCode, Vec<u8>)>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl ScriptedNetwork {
    pub fn online() -> Self {
        Self {
            online: AtomicBool::new(true),
            fail_next: AtomicUsize::new(0),
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        let network = Self::online();
        network.set_online(false);
        network
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Makes the next `count` fetches fail regardless of the online flag.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn respond(&self, method: Method, url: &str, status: StatusCode, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, url), (status, body.into()));
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, NetworkError> {
        self.calls.lock().unwrap().push(request.clone());

        let forced_failure = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced_failure || !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable("scripted offline".into()));
        }

        let key = format!("{} {}", request.method, request.url);
        let response = match self.routes.lock().unwrap().get(&key) {
            Some((status, body)) => FetchResponse::new(*status, body.clone()),
            None => FetchResponse::new(StatusCode::OK, "ok"),
        };
        Ok(response)
    }
}
