//! Shared helpers for the provider integration tests.

#![allow(dead_code)]

use serde_json::Value;
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

/// Route provider logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Paths of every request the server saw, in arrival order.
pub async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|req| match req.url.query() {
            Some(query) => format!("{}?{query}", req.url.path()),
            None => req.url.path().to_string(),
        })
        .collect()
}

/// JSON bodies and `page` query values of requests sent to `path`.
pub async fn json_requests_to(server: &MockServer, path: &str) -> Vec<(String, Value)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path() == path)
        .map(|req| {
            let page = req
                .url
                .query_pairs()
                .find(|(k, _)| k == "page")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            let body = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            (page, body)
        })
        .collect()
}
