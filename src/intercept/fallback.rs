//! Offline substitutes returned when neither network nor cache can answer.

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::json;

use crate::fetch::{FetchResponse, ResponseSource};

/// Inline "no image" graphic served for image requests.
pub const PLACEHOLDER_SVG: &str = concat!(
    r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200">"##,
    r##"<rect width="200" height="200" fill="#f3f4f6"/>"##,
    r##"<text x="100" y="105" text-anchor="middle" font-family="sans-serif" font-size="14" fill="#9ca3af">No image</text>"##,
    r##"</svg>"##
);

/// Built-in page used when the offline page was never precached.
pub const BUILTIN_OFFLINE_PAGE: &str = concat!(
    "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">",
    "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
    "<title>Offline</title></head><body>",
    "<h1>You are offline</h1>",
    "<p>This page is not available without a connection. Pending changes are kept and will be sent when the connection returns.</p>",
    "</body></html>"
);

pub fn image_placeholder() -> FetchResponse {
    FetchResponse::new(StatusCode::OK, PLACEHOLDER_SVG)
        .with_header(header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"))
        .with_source(ResponseSource::Fallback)
}

/// 503 with a JSON body for API callers.
pub fn offline_api() -> FetchResponse {
    FetchResponse::json(
        StatusCode::SERVICE_UNAVAILABLE,
        &json!({
            "error": "Offline",
            "message": "No network connection and no cached data available",
            "offline": true
        }),
    )
    .with_source(ResponseSource::Fallback)
}

pub fn builtin_offline_page() -> FetchResponse {
    FetchResponse::new(StatusCode::SERVICE_UNAVAILABLE, BUILTIN_OFFLINE_PAGE)
        .with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        )
        .with_source(ResponseSource::Fallback)
}

pub fn service_unavailable() -> FetchResponse {
    FetchResponse::new(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
        .with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )
        .with_source(ResponseSource::Fallback)
}
