//! Sequenced catalog fetches
//!
//! [`CatalogFetcher`] tracks the state of the result list. Every request is
//! tagged with a [`FetchTicket`] when it starts; a response is applied only if
//! its ticket is still the most recently issued one. Responses to superseded
//! requests are logged and dropped, so a slow early response can never
//! overwrite the result of a later request.
//!
//! ```rust
//! use agro_catalog::prelude::*;
//!
//! let fetcher = CatalogFetcher::default();
//! let first = fetcher.begin();
//! let second = fetcher.begin();
//! let empty = || CatalogPage { items: vec![], total_results: 0, total_pages: 1, current_page: 1 };
//!
//! assert!(fetcher.complete(second, Ok(empty())));
//! // the earlier request answered late: ignored
//! assert!(!fetcher.complete(first, Err(CatalogError::Unauthorized)));
//! assert_eq!(fetcher.display(), DisplayState::NoResults);
//! assert!(matches!(fetcher.state(), FetchState::Success(_)));
//! ```

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{Result, error::CatalogError, listings::CatalogPage, query::SearchRequest};

/// Source of catalog pages. Implemented by [`CatalogClient`](crate::client::CatalogClient)
/// and by test fakes.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    async fn search(&self, request: &SearchRequest) -> Result<CatalogPage>;
}

impl<T: CatalogSource> CatalogSource for &T {
    async fn search(&self, request: &SearchRequest) -> Result<CatalogPage> {
        (**self).search(request).await
    }
}

/// Failure summary kept in [`FetchState::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    /// http status, when the server answered
    pub status: Option<u16>,
}

impl From<&CatalogError> for FetchFailure {
    fn from(err: &CatalogError) -> Self {
        let status = match err {
            CatalogError::ApiError { code, .. } => Some(*code),
            CatalogError::Validation { .. } => Some(400),
            CatalogError::Unauthorized => Some(401),
            CatalogError::Forbidden => Some(403),
            CatalogError::NotFound { .. } => Some(404),
            CatalogError::Http { source, .. } => source.status().map(|code| code.as_u16()),
            _ => None,
        };
        Self {
            message: err.to_string(),
            status,
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "({code}) {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// State of the result list.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState {
    /// nothing requested yet
    #[default]
    Idle,
    Loading,
    Success(CatalogPage),
    /// the prior page is not kept
    Error(FetchFailure),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the page, for a successful fetch.
    pub fn page(&self) -> Option<&CatalogPage> {
        match self {
            Self::Success(page) => Some(page),
            _ => None,
        }
    }

    /// What the result area shows for this state.
    pub fn display(&self) -> DisplayState {
        match self {
            Self::Idle | Self::Loading => DisplayState::Spinner,
            Self::Success(page) if !page.is_empty() => DisplayState::Results,
            Self::Success(_) | Self::Error(_) => DisplayState::NoResults,
        }
    }
}

/// Visual state of the result area.
///
/// An empty result and a failed fetch both show "no results"; use
/// [`CatalogFetcher::state`] to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DisplayState {
    Spinner,
    Results,
    NoResults,
}

/// Tag of one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket {
    seq: u64,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
struct FetcherInner {
    /// last issued sequence number; 0 = none issued
    issued: u64,
    state: FetchState,
}

/// Holds the fetch state and the request sequence.
///
/// The lock is only taken for bookkeeping and never held across an await.
#[derive(Debug, Default)]
pub struct CatalogFetcher {
    inner: Mutex<FetcherInner>,
}

impl CatalogFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket for a new request and moves to `Loading`.
    pub fn begin(&self) -> FetchTicket {
        let mut inner = self.inner.lock();
        inner.issued += 1;
        inner.state = FetchState::Loading;
        FetchTicket { seq: inner.issued }
    }

    /// Applies `result` if `ticket` is the most recent one.
    /// Returns false if the response was stale and discarded.
    pub fn complete(&self, ticket: FetchTicket, result: Result<CatalogPage>) -> bool {
        let mut inner = self.inner.lock();
        if ticket.seq != inner.issued {
            warn!(
                seq = ticket.seq,
                latest = inner.issued,
                ok = result.is_ok(),
                "discarding stale catalog response"
            );
            return false;
        }
        inner.state = match result {
            Ok(page) => {
                debug!(seq = ticket.seq, items = page.len(), "catalog page applied");
                FetchState::Success(page)
            }
            Err(err) => {
                debug!(seq = ticket.seq, error = %err, "catalog fetch failed");
                FetchState::Error(FetchFailure::from(&err))
            }
        };
        true
    }

    /// Runs one sequenced request against `source`. No retries.
    ///
    /// Returns the state after completion, which is the state set by a newer
    /// request if this one was superseded.
    pub async fn fetch<S: CatalogSource>(&self, source: &S, request: &SearchRequest) -> FetchState {
        let ticket = self.begin();
        let result = source.search(request).await;
        self.complete(ticket, result);
        self.state()
    }

    pub fn state(&self) -> FetchState {
        self.inner.lock().state.clone()
    }

    /// Returns the current page, if the last applied fetch succeeded.
    pub fn page(&self) -> Option<CatalogPage> {
        self.inner.lock().state.page().cloned()
    }

    pub fn display(&self) -> DisplayState {
        self.inner.lock().state.display()
    }
}
