//! Push Notifications
//!
//! Turns push payloads into user-visible notifications and resolves clicks
//! on them to a client window.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::fetch::{normalize_url, parse_url};

pub const DEFAULT_TITLE: &str = "Transporte Esmeralda";
pub const NOTIFICATION_ICON: &str = "/icons/icon-192x192.png";
pub const NOTIFICATION_BADGE: &str = "/icons/icon-72x72.png";
const VIBRATION_PATTERN: [u32; 3] = [100, 50, 100];

// == Push Payload ==
/// Message delivered by the notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub data: Value,
    pub require_interaction: bool,
    pub silent: bool,
}

impl Default for PushPayload {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: String::new(),
            data: Value::Null,
            require_interaction: false,
            silent: false,
        }
    }
}

impl PushPayload {
    /// Parses a push message. Anything that is not a JSON object becomes the
    /// body of a default notification.
    pub fn parse(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        match serde_json::from_slice::<PushPayload>(raw) {
            Ok(payload) => payload,
            Err(err) => {
                debug!("Push payload is not JSON ({}), using it as text", err);
                Self {
                    body: String::from_utf8_lossy(raw).into_owned(),
                    ..Self::default()
                }
            }
        }
    }
}

// == Notification ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: Value,
    pub require_interaction: bool,
    pub silent: bool,
    pub actions: Vec<NotificationAction>,
}

/// Builds the notification shown for a push payload.
pub fn build_notification(payload: PushPayload) -> Notification {
    Notification {
        title: payload.title,
        body: payload.body,
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_BADGE.to_string(),
        vibrate: VIBRATION_PATTERN.to_vec(),
        data: payload.data,
        require_interaction: payload.require_interaction,
        silent: payload.silent,
        actions: vec![
            NotificationAction {
                action: "open".to_string(),
                title: "Abrir".to_string(),
            },
            NotificationAction {
                action: "close".to_string(),
                title: "Cerrar".to_string(),
            },
        ],
    }
}

// == Click Resolution ==
/// A window the hosting runtime reports as open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Focus { client_id: String },
    Open { url: String },
    Dismiss,
}

/// Decides what a notification click does.
///
/// `open` (or no action) focuses a window already showing the target URL,
/// otherwise opens one. Any other action only dismisses the notification.
pub fn resolve_click(action: Option<&str>, data: &Value, clients: &[ClientWindow]) -> ClickOutcome {
    match action {
        None | Some("") | Some("open") => {}
        Some("close") => return ClickOutcome::Dismiss,
        Some(other) => {
            warn!("Unknown notification action '{}', dismissing", other);
            return ClickOutcome::Dismiss;
        }
    }

    let target = data
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .unwrap_or("/");
    let wanted = same_page_key(target);

    match clients.iter().find(|client| same_page_key(&client.url) == wanted) {
        Some(client) => ClickOutcome::Focus {
            client_id: client.id.clone(),
        },
        None => ClickOutcome::Open {
            url: target.to_string(),
        },
    }
}

/// Path and query of a URL; origin and fragment do not distinguish pages.
fn same_page_key(raw: &str) -> String {
    match parse_url(raw) {
        Some(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        None => normalize_url(raw),
    }
}
