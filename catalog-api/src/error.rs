//! Errors returned by `CatalogClient` and the catalog core
//!
use std::path::PathBuf;

use snafu::prelude::*;

/// Errors returned by agro-catalog crate
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CatalogError {
    // Http connection or timeout error
    #[snafu(display("HTTP error {method} url:{url}"))]
    Http {
        method: String,
        url: String,
        source: reqwest::Error,
    },

    /// Catalog server responded with an error status not covered by a more specific variant.
    #[snafu(display("Api Server reported error ({code}) {method} {url}: {message}"))]
    ApiError {
        code: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Deserialization error. The server response did not have the expected shape.
    #[snafu(display("Deserialization: {source}"))]
    Deserialization { source: serde_json::Error },

    /// Expected item was not found. Returned for listing lookup by id,
    /// or any other path answered with 404/410.
    #[snafu(display("{obj_type} {key} not found"))]
    NotFound { obj_type: String, key: String },

    /// No bearer token configured, or the server rejected it (401).
    #[snafu(display("Client is not authenticated. Set a bearer token first."))]
    Unauthorized,

    /// Token is valid but not allowed to perform the operation (403).
    #[snafu(display("Permission denied"))]
    Forbidden,

    /// The server rejected the request as invalid (400), or a local check failed.
    #[snafu(display("Validation error: {message}"))]
    Validation { message: String },

    /// Failed reading a local file, for example a media file queued for upload.
    #[snafu(display("file {path:?}: {source}"))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Error encountered by the configured `Storage`.
    #[snafu(display("Storage: {source}"))]
    Storage { source: StorageError },

    /// Some other error occurred
    #[snafu(display("{message}"))]
    Other { message: String },
}

/// Errors arising from `Storage` implementations
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// Problem reading or writing the storage file
    #[snafu(display("storage file {path:?} {source}"))]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Storage file exists but is not a JSON object of strings
    #[snafu(display("storage file {path:?} is corrupt: {source}"))]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Other error type - can be used by external implementations
    #[snafu(display("storage {message}"))]
    External { message: String },
}

impl From<StorageError> for CatalogError {
    fn from(source: StorageError) -> Self {
        Self::Storage { source }
    }
}
