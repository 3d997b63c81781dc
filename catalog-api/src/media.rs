//! Media uploads
//!
//! Files are uploaded one at a time with `POST /media/{kind}` (multipart field
//! `file`, bearer token required). [`upload_batch`] uploads a list of files in
//! order and stops at the first failure, returning what was uploaded before it.
//!
//! ```rust,no_run
//! use agro_catalog::prelude::*;
//! # async fn example(client: &CatalogClient) -> Result<(), CatalogError> {
//! let files = vec![
//!     MediaFile::from_path("fotos/entrada.jpg").await?,
//!     MediaFile::from_path("fotos/lago.jpg").await?,
//! ];
//! let batch = upload_batch(client, MediaKind::Image, &files).await;
//! for media in &batch.uploaded {
//!     println!("{}", media.url);
//! }
//! if let Some((file, err)) = &batch.failure {
//!     eprintln!("{file}: {err}");
//! }
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::{
    Result,
    error::{CatalogError, IoSnafu},
};

/// Kind of media, selecting the upload endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    /// 360 degree panorama
    Image360,
}

/// A file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl MediaFile {
    /// Creates a media file from memory. The content type is guessed from the file name.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        Self {
            content_type: guess_content_type(&file_name),
            file_name,
            bytes: bytes.into(),
        }
    }

    /// Reads a media file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.context(IoSnafu { path })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        debug!(?path, size = bytes.len(), "read media file");
        Ok(Self::new(file_name, bytes))
    }

    #[must_use]
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn to_form(&self) -> Result<reqwest::multipart::Form> {
        let part = reqwest::multipart::Part::bytes(self.bytes.to_vec())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|_| CatalogError::Validation {
                message: format!(
                    "invalid content type {:?} for {}",
                    self.content_type, self.file_name
                ),
            })?;
        Ok(reqwest::multipart::Form::new().part("file", part))
    }
}

fn guess_content_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Server response for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
}

/// Destination of media uploads. Implemented by [`CatalogClient`](crate::client::CatalogClient).
#[allow(async_fn_in_trait)]
pub trait MediaSink {
    async fn upload(&self, kind: MediaKind, file: &MediaFile) -> Result<UploadedMedia>;
}

impl<T: MediaSink> MediaSink for &T {
    async fn upload(&self, kind: MediaKind, file: &MediaFile) -> Result<UploadedMedia> {
        (**self).upload(kind, file).await
    }
}

/// Outcome of [`upload_batch`].
#[derive(Debug, Default)]
pub struct UploadBatch {
    /// Files uploaded before the first failure, in order
    pub uploaded: Vec<UploadedMedia>,
    /// Name of the failed file and its error. Files after it were not attempted.
    pub failure: Option<(String, CatalogError)>,
}

impl UploadBatch {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Converts into a result, discarding partial uploads on failure.
    pub fn into_result(self) -> Result<Vec<UploadedMedia>> {
        match self.failure {
            None => Ok(self.uploaded),
            Some((_, err)) => Err(err),
        }
    }
}

/// Uploads `files` in order, one request at a time, stopping at the first error.
pub async fn upload_batch<M: MediaSink>(sink: &M, kind: MediaKind, files: &[MediaFile]) -> UploadBatch {
    let mut batch = UploadBatch::default();
    for file in files {
        match sink.upload(kind, file).await {
            Ok(media) => {
                debug!(file = %file.file_name, url = %media.url, "uploaded");
                batch.uploaded.push(media);
            }
            Err(err) => {
                warn!(file = %file.file_name, error = %err, uploaded = batch.uploaded.len(), "upload failed");
                batch.failure = Some((file.file_name.clone(), err));
                break;
            }
        }
    }
    batch
}
