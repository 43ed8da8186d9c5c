//! Async HTTP client wrapping reqwest.
//!
//! Every call builds its own `reqwest::Client` and drops it before the call
//! returns, on success and on every error path alike. Sessions are never
//! shared between calls and idle connections are not pooled. Nothing is
//! retried.

use crate::types::{CatalogError, CatalogResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("neuro-catalog/", env!("CARGO_PKG_VERSION"));

/// Response from an HTTP request, whatever its status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Session settings applied to every per-call client.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl HttpClient {
    /// Create a client. `None` leaves request latency unbounded.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            accept_invalid_certs: false,
        }
    }

    /// Skip TLS certificate verification for every request.
    ///
    /// The ModelDB HTML host is scraped this way. Anything on the path can
    /// impersonate that host.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    fn session(&self, url: &str) -> CatalogResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(0);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(|e| CatalogError::transport(url, e))
    }

    /// GET a URL and return the response regardless of status.
    pub async fn get(&self, url: &str) -> CatalogResult<HttpResponse> {
        tracing::debug!("fetch url {url}");
        let session = self.session(url)?;
        let resp = session
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::transport(url, e))?;
        read_response(url, resp).await
    }

    /// GET a URL and decode a 200 JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> CatalogResult<T> {
        let resp = self.get(url).await?;
        decode_json(resp)
    }

    /// POST a JSON body and decode a 200 JSON response.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> CatalogResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("post url {url}");
        let session = self.session(url)?;
        let resp = session
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CatalogError::transport(url, e))?;
        decode_json(read_response(url, resp).await?)
    }
}

async fn read_response(url: &str, resp: reqwest::Response) -> CatalogResult<HttpResponse> {
    let status = resp.status().as_u16();
    let final_url = resp.url().to_string();
    tracing::debug!("response status for url {url} {status}");

    let body = resp
        .text()
        .await
        .map_err(|e| CatalogError::transport(url, e))?;

    Ok(HttpResponse {
        url: url.to_string(),
        final_url,
        status,
        body,
    })
}

fn decode_json<T: DeserializeOwned>(resp: HttpResponse) -> CatalogResult<T> {
    if !resp.is_ok() {
        return Err(CatalogError::Status {
            url: resp.url,
            status: resp.status,
        });
    }
    serde_json::from_str(&resp.body).map_err(|e| CatalogError::decode(&resp.url, e))
}
