/*
 * Agro property catalog client
 *
 * SPDX-FileCopyrightText: 2025-2026 Agro Catalog contributors
 * SPDX-License-Identifier: Apache-2.0
 */
//! # Agro Catalog
//!
//! Client core for the agro property catalog service.
//!
//! ## Features
//!
//! - immutable filter snapshots with point updates, facet toggles and reset
//! - query building for the catalog search endpoint
//! - sequenced catalog fetches: late responses from superseded requests are discarded
//! - pagination windows with gap markers
//! - facet vocabularies fetched once per load
//! - persisted last selection through an injected key-value [`Storage`](storage::Storage)
//! - sequential media uploads that stop at the first failure
//! - http request logging and metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agro_catalog::prelude::*;
//! # async fn example() -> Result<(), CatalogError> {
//!
//! let client = CatalogClient::with_config(ClientConfig::default())?;
//! let controller = CatalogController::new(
//!     client,
//!     MemoryStorage::default(),
//!     ControllerSettings::default(),
//! );
//!
//! controller.set_property_type("finca");
//! controller.apply_filters(
//!     FilterSnapshot::default()
//!         .update(FilterField::Municipality, "Bucaramanga")
//!         .toggle(SetField::SoilTypes, "arenoso"),
//! );
//!
//! if let FetchState::Success(page) = controller.refresh().await {
//!     for listing in &page.items {
//!         println!("{} {}", listing.id, listing.title);
//!     }
//!     println!("{:?}", controller.page_window());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Notes on API Design
//!
//! - `FilterSnapshot` is a value: every edit returns a new snapshot.
//! - `SearchRequest` is built fresh for every fetch and never mutated.
//! - The controller owns the filter snapshot, pagination and fetcher; any change
//!   of property type, filters, search term, sort or page size resets the page to 1.
//! - Network access goes through the `CatalogSource`, `OptionsSource` and
//!   `MediaSink` traits, implemented by `CatalogClient`.
//!
#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::missing_const_for_fn)] //  nursery function
#![allow(clippy::must_use_candidate)] // pedantic
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::needless_raw_strings)]
#![warn(clippy::option_if_let_else)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unnecessary_wraps)]
#![warn(clippy::unused_async)]

pub mod auth;
pub mod client;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod filters;
mod http_client;
pub mod listings;
pub mod media;
pub mod paged;
pub mod query;
pub mod storage;
pub mod vocabulary;

/// Result type alias using `CatalogError` as the default error.
pub type Result<T, E = crate::error::CatalogError> = std::result::Result<T, E>;

/// Prelude module - import the common types with `use agro_catalog::prelude::*;`
pub mod prelude {
    pub use super::{CATALOG_DEFAULT_URL, DEFAULT_PAGE_SIZE};
    // Error types
    pub use crate::error::*;
    pub use crate::{
        auth::BearerToken,
        client::{CatalogClient, ClientConfig},
        // Page-level controller
        controller::{CatalogController, ControllerSettings, storage_keys},
        // Fetch state machine
        fetcher::{CatalogFetcher, CatalogSource, DisplayState, FetchFailure, FetchState, FetchTicket},
        // Filter state
        filters::{FilterField, FilterSnapshot, SetField},
        // HTTP metrics
        http_client::HttpMetricsSnapshot,
        // Catalog data
        listings::{CatalogPage, ListingLocation, PropertyListing},
        // Media uploads
        media::{MediaFile, MediaKind, MediaSink, UploadBatch, UploadedMedia, upload_batch},
        // Pagination
        paged::{PageSlot, Pagination, page_window},
        // Query building
        query::{SearchRequest, SortOrder, build},
        // Persisted selection
        storage::{FileStorage, MemoryStorage, Storage},
        // Facet vocabularies
        vocabulary::{FacetCategory, OptionsSource, Vocabulary},
    };
}

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default catalog api endpoint
pub const CATALOG_DEFAULT_URL: &str = "http://127.0.0.1:3000/api";

/// Number of listings requested per catalog page
pub const DEFAULT_PAGE_SIZE: u32 = 12;

pub(crate) mod config {
    /// Environment variable for default endpoint URL
    pub const CATALOG_URL_ENV: &str = "AGRO_CATALOG_URL";

    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}
