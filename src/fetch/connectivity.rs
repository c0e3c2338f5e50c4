//! Connectivity tracking
//!
//! The interceptor reports every network outcome here; the reconnect task
//! subscribes and fires sync triggers on an offline to online transition.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    /// No network call has completed yet
    Unknown,
    Online,
    Offline,
}

/// Last observed link state plus the number of offline to online edges seen.
///
/// `reconnects` only grows, so a subscriber that misses intermediate values
/// still sees that a reconnect happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub state: LinkState,
    pub reconnects: u64,
}

/// Shared handle to the last observed link state.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<LinkStatus>>,
}

impl Connectivity {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LinkStatus {
            state: LinkState::Unknown,
            reconnects: 0,
        });
        Self { tx: Arc::new(tx) }
    }

    pub fn report_online(&self) {
        self.transition(LinkState::Online);
    }

    pub fn report_offline(&self) {
        self.transition(LinkState::Offline);
    }

    pub fn state(&self) -> LinkState {
        self.tx.borrow().state
    }

    pub fn reconnects(&self) -> u64 {
        self.tx.borrow().reconnects
    }

    pub fn subscribe(&self) -> watch::Receiver<LinkStatus> {
        self.tx.subscribe()
    }

    fn transition(&self, next: LinkState) {
        let changed = self.tx.send_if_modified(|status| {
            if status.state == next {
                return false;
            }
            if status.state == LinkState::Offline && next == LinkState::Online {
                status.reconnects += 1;
            }
            status.state = next;
            true
        });
        if changed {
            info!("Link state changed to {:?}", next);
        }
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}
