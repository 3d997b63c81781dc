//! Catalog API Client
//!
//! # Creating new api client
//!
//! - [with_config](CatalogClient::with_config) - create client with custom configuration
//! - [with_client](CatalogClient::with_client) - create client with configuration and custom reqwest client
//!
//! # Endpoints
//!
//! - [search](CatalogClient::search) - `GET /terrains`, one page of results
//! - [listing](CatalogClient::listing) - `GET /terrains/{id}`, listing detail
//! - [options](CatalogClient::options) - `GET /configuration/{category}`, facet vocabulary
//! - [upload_media](CatalogClient::upload_media) - `POST /media/{kind}`, authenticated upload
//!

use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::{
    CATALOG_DEFAULT_URL, DEFAULT_PAGE_SIZE, Result,
    config::{CATALOG_URL_ENV, DEFAULT_TIMEOUT_SECS},
    fetcher::CatalogSource,
    http_client::{HttpClient, HttpMetricsSnapshot},
    listings::{CatalogResponse, PropertyListing},
    media::{MediaFile, MediaKind, MediaSink, UploadedMedia},
    prelude::*,
    query::SearchRequest,
    vocabulary::{FacetCategory, OptionsSource},
};

/// Configuration for the catalog client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base url for all catalog api requests.
    /// If not provided in config, url is determined by:
    /// * The environment variable `AGRO_CATALOG_URL`, if defined, or
    /// * `agro_catalog::CATALOG_DEFAULT_URL`
    pub base_url: String,

    /// Listings per catalog page (default 12)
    pub page_size: u32,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: std::env::var(CATALOG_URL_ENV).unwrap_or(CATALOG_DEFAULT_URL.to_string()),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Sets the base url.
    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..self
        }
    }

    /// Sets the page size. Zero is raised to 1.
    pub fn page_size(self, page_size: u32) -> Self {
        ClientConfig {
            page_size: page_size.max(1),
            ..self
        }
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        ClientConfig { timeout, ..self }
    }
}

/// Client for the remote catalog service.
#[derive(Clone)]
pub struct CatalogClient {
    pub(crate) client: Arc<HttpClient>,
    pub(crate) config: ClientConfig,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("config", &self.config)
            .field("authenticated", &self.client.has_token())
            .finish()
    }
}

impl CatalogClient {
    /// Creates a new client with the provided configuration.
    ///
    /// # Example
    /// ```rust,no_run
    /// use agro_catalog::prelude::*;
    /// # fn create_client() -> Result<CatalogClient, CatalogError> {
    /// let config = ClientConfig::default().base_url("https://catalog.example.co/api");
    /// let client = CatalogClient::with_config(config)?;
    /// # Ok(client)
    /// # }
    /// ```
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let builder = reqwest::Client::builder().timeout(config.timeout);
        Self::with_client(builder, config)
    }

    /// Creates a client from a `reqwest::ClientBuilder` and configuration.
    /// ClientBuilder can be customized with proxies, dns servers, user_agent, etc.
    /// The configured timeout is not applied to a caller-supplied builder.
    pub fn with_client(client: reqwest::ClientBuilder, config: ClientConfig) -> Result<Self> {
        debug!(url=?config.base_url, "new client");
        let client = HttpClient::new(client, config.base_url.clone())?;
        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Returns the configuration.
    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sets the bearer token used for authenticated endpoints.
    pub fn set_token(&self, token: BearerToken) {
        self.client.set_token(token);
    }

    /// Forgets the bearer token.
    pub fn clear_token(&self) {
        self.client.clear_token();
    }

    /// Returns true if a bearer token is set.
    pub fn is_authenticated(&self) -> bool {
        self.client.has_token()
    }

    /// Returns a snapshot of current HTTP metrics.
    pub fn http_metrics(&self) -> HttpMetricsSnapshot {
        self.client.metrics_snapshot()
    }

    /// Fetches one page of catalog results.
    pub async fn search(&self, request: &SearchRequest) -> Result<CatalogPage> {
        let response: CatalogResponse = self
            .client
            .get_request("/terrains", request.params())
            .await?;
        let page = response.into_page(request.page);
        debug!(
            items = page.len(),
            total = page.total_results,
            pages = page.total_pages,
            "catalog search"
        );
        Ok(page)
    }

    /// Fetches a single listing by id.
    /// The id must be a single path segment.
    pub async fn listing(&self, id: &str) -> Result<PropertyListing> {
        if id.trim().is_empty() {
            return Err(CatalogError::Validation {
                message: "listing id cannot be empty".to_string(),
            });
        }
        if matches!(id, "." | "..") || id.contains(['/', '\\', '?', '#', '%']) {
            return Err(CatalogError::Validation {
                message: format!("invalid listing id {id:?}"),
            });
        }
        self.client
            .get_request(&format!("/terrains/{id}"), Vec::new())
            .await
            .map_err(|err| match err {
                CatalogError::NotFound { .. } => CatalogError::NotFound {
                    obj_type: "Listing".to_string(),
                    key: id.to_string(),
                },
                other => other,
            })
    }

    /// Fetches the vocabulary of one facet.
    pub async fn options(&self, category: FacetCategory) -> Result<Vec<String>> {
        self.client
            .get_request(&format!("/configuration/{category}"), Vec::new())
            .await
    }

    /// Uploads one media file. Requires a bearer token.
    pub async fn upload_media(&self, kind: MediaKind, file: &MediaFile) -> Result<UploadedMedia> {
        let size = file.len() as u64;
        let form = file.to_form()?;
        self.client
            .post_multipart(&format!("/media/{kind}"), form, size)
            .await
    }
}

impl CatalogSource for CatalogClient {
    async fn search(&self, request: &SearchRequest) -> Result<CatalogPage> {
        CatalogClient::search(self, request).await
    }
}

impl OptionsSource for CatalogClient {
    async fn options(&self, category: FacetCategory) -> Result<Vec<String>> {
        CatalogClient::options(self, category).await
    }
}

impl MediaSink for CatalogClient {
    async fn upload(&self, kind: MediaKind, file: &MediaFile) -> Result<UploadedMedia> {
        self.upload_media(kind, file).await
    }
}
