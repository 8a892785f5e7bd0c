//! Shared HTTP client and auth/status utilities.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::BackendError;

/// Upper bound on any single backend request, including an in-flight call
/// that a canceled run is waiting on.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "falling back to default HTTP client");
                reqwest::Client::new()
            })
    })
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Classify a transport failure; a client-side timeout becomes
/// [`BackendError::Timeout`] so it is categorized and retried as one.
pub fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(REQUEST_TIMEOUT.as_millis() as u64)
    } else {
        BackendError::Network(err)
    }
}

/// Map a non-success HTTP status to a backend error.
pub fn status_to_error(status: u16, body: &str) -> BackendError {
    match status {
        401 | 403 => BackendError::Authentication(body.to_string()),
        429 => BackendError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => BackendError::api(status, body),
    }
}

/// Drain a failed response and classify it.
pub async fn read_error_body(status: u16, resp: reqwest::Response) -> BackendError {
    let body = resp.text().await.unwrap_or_default();
    status_to_error(status, &body)
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}
