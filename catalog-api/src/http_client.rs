//! HttpClient used by CatalogClient
//!
//! Responsible for
//!  - handing all HTTP api requests
//!  - logging/tracing
//!  - mapping http error codes into `CatalogError`s
//!  - request metrics
//!
//! Requests are never retried. Recovery is left to the user (re-apply filters, re-submit).

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use reqwest::{ClientBuilder, Method, StatusCode, multipart::Form};
use serde::de::DeserializeOwned;
use snafu::prelude::*;
use tracing::{debug, error, trace};

use crate::{Result, auth::BearerToken, error::*};

/// HTTP metrics tracked using atomic counters for thread-safe access.
/// These counters are cumulative and never reset during the client's lifetime.
#[derive(Debug, Default)]
pub struct HttpMetrics {
    /// Total number of HTTP requests sent to the server
    total_requests: AtomicU64,
    /// Total number of successful responses (2xx status codes)
    successful_responses: AtomicU64,
    /// Total number of error responses and transport failures
    errors: AtomicU64,
    /// Total bytes sent in request bodies (multipart bodies are counted by file size)
    bytes_sent: AtomicU64,
    /// Total bytes received in response bodies
    bytes_received: AtomicU64,
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of current metrics as plain u64 values
    pub fn snapshot(&self) -> HttpMetricsSnapshot {
        HttpMetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_responses: self.successful_responses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }

    fn increment_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_success(&self) {
        self.successful_responses.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn add_bytes_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    fn add_bytes_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of HTTP metrics with plain u64 values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpMetricsSnapshot {
    /// Total number of HTTP requests sent to the server
    pub total_requests: u64,
    /// Total number of successful responses (2xx status codes)
    pub successful_responses: u64,
    /// Total number of error responses and transport failures
    pub errors: u64,
    /// Total bytes sent in request bodies
    pub bytes_sent: u64,
    /// Total bytes received in response bodies
    pub bytes_received: u64,
}

impl fmt::Display for HttpMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests={} success={} errors={} sent={} recv={}",
            self.total_requests,
            self.successful_responses,
            self.errors,
            format_bytes(self.bytes_sent),
            format_bytes(self.bytes_received),
        )
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes}B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[derive(Clone, Default)]
pub(crate) struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    pub client: reqwest::Client,

    /// Base URL for API requests (e.g., "http://localhost:3000/api")
    pub base_url: String,

    pub token: Arc<Mutex<Option<BearerToken>>>,

    /// HTTP request/response metrics
    pub metrics: Arc<HttpMetrics>,
}

impl HttpClient {
    pub fn new(builder: ClientBuilder, base_url: String) -> Result<Self> {
        let client = builder.build().context(HttpSnafu {
            method: "client-init",
            url: "",
        })?;
        Ok(HttpClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(Mutex::new(None)),
            metrics: Arc::new(HttpMetrics::new()),
        })
    }

    /// Returns a snapshot of current HTTP metrics
    pub fn metrics_snapshot(&self) -> HttpMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Returns true if a bearer token has been set.
    pub fn has_token(&self) -> bool {
        self.token.lock().as_ref().is_some_and(BearerToken::has_token)
    }

    pub fn set_token(&self, token: BearerToken) {
        *self.token.lock() = Some(token);
    }

    pub fn clear_token(&self) {
        self.token.lock().take();
    }

    /// Makes a GET request with query parameters.
    pub(crate) async fn get_request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        let req = HttpRequest {
            method: Method::GET,
            path: path.into(),
            query,
        };
        let full_url = format!("{}{}", self.base_url, req.path);
        let builder = self.client.get(&full_url).query(&req.query);
        log_request(&req, &builder);
        self.send(req, builder, 0).await
    }

    /// Makes an authenticated multipart POST request.
    /// `body_size` is only used for metrics.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        body_size: u64,
    ) -> Result<T> {
        let token = self
            .token
            .lock()
            .clone()
            .filter(BearerToken::has_token)
            .ok_or(CatalogError::Unauthorized)?;
        let req = HttpRequest {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
        };
        let full_url = format!("{}{}", self.base_url, req.path);
        let builder = token.set_auth_header(self.client.post(&full_url));
        log_request(&req, &builder);
        self.send(req, builder.multipart(form), body_size).await
    }

    /// Sends one request and decodes the json response.
    /// - exactly one attempt; no retries
    /// - maps http error codes into CatalogErrors
    /// - deserializes json response body into return type T
    async fn send<T: DeserializeOwned>(
        &self,
        req: HttpRequest,
        builder: reqwest::RequestBuilder,
        body_size: u64,
    ) -> Result<T> {
        self.metrics.increment_requests();
        self.metrics.add_bytes_sent(body_size);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(source=?e, ?req, "http");
                self.metrics.increment_errors();
                return Err(CatalogError::Http {
                    method: req.method.to_string(),
                    url: req.path,
                    source: e,
                });
            }
        };

        let code = response.status();
        if code.is_success() {
            let body = response.bytes().await.context(HttpSnafu {
                method: req.method.to_string(),
                url: req.path.clone(),
            })?;
            self.metrics.increment_success();
            self.metrics.add_bytes_received(body.len() as u64);
            log_response(&req.path, &body);
            return deserialize_json(&body);
        }

        self.metrics.increment_errors();
        let message = response.text().await.unwrap_or_default();
        error!(?code, ?message, ?req, "http");
        Err(map_status(code, &req, message))
    }
}

// map a non-2xx status to the matching error
fn map_status(code: StatusCode, req: &HttpRequest, message: String) -> CatalogError {
    match code {
        StatusCode::BAD_REQUEST /* 400 */ => CatalogError::Validation { message },
        StatusCode::UNAUTHORIZED /* 401 */ => CatalogError::Unauthorized,
        StatusCode::FORBIDDEN /* 403 */ => CatalogError::Forbidden,
        StatusCode::NOT_FOUND /* 404 */ | StatusCode::GONE /* 410 */ => CatalogError::NotFound {
            obj_type: "resource".into(),
            key: req.path.clone(),
        },
        _ => CatalogError::ApiError {
            code: code.as_u16(),
            method: req.method.to_string(),
            url: req.path.clone(),
            message,
        },
    }
}

// dump request
// requires RUST_LOG=agro_catalog::http_json=trace
fn log_request(req: &HttpRequest, builder: &reqwest::RequestBuilder) {
    debug!(method = %req.method, path = %req.path, "http request");
    if tracing::enabled!(target: "agro_catalog::http_json", tracing::Level::TRACE)
        && let Some(built) = builder.try_clone().and_then(|b| b.build().ok())
    {
        // don't log headers so we don't leak the bearer token
        trace!(target: "agro_catalog::http_json", "{} url={}", built.method(), built.url());
    }
}

// dump json response, for debugging
fn log_response(path: &str, body: &[u8]) {
    if tracing::enabled!(target: "agro_catalog::http_json", tracing::Level::TRACE) {
        trace!(target: "agro_catalog::http_json", "Response path={path} body={}",
            String::from_utf8_lossy(body)
        );
    }
}

// deserialize, reporting errors with 'serde_path_to_error', which provides
// detailed json path to the error
pub(crate) fn deserialize_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(value) => Ok(value),
        Err(err) => {
            error!("Deserialization failed at {}: {}", err.path(), err);
            Err(CatalogError::Deserialization {
                source: err.into_inner(),
            })
        }
    }
}
