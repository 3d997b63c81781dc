//! Page-level catalog controller
//!
//! [`CatalogController`] owns the selection (property type, filter snapshot,
//! search term, sort, page size), the [`Pagination`] and the [`CatalogFetcher`].
//! It is the only writer of those values:
//!
//! - every change of property type, filters, search term, sort or page size
//!   resets the current page to 1
//! - property type, filters and sort are written to the injected [`Storage`]
//!   on change, and read back once in [`CatalogController::new`]
//! - [`refresh`](CatalogController::refresh) builds a fresh [`SearchRequest`]
//!   and runs one sequenced fetch
//!
//! Methods take `&self`; state lives behind short-lived locks so overlapping
//! refreshes are allowed, and the most recently issued one wins.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    DEFAULT_PAGE_SIZE,
    fetcher::{CatalogFetcher, CatalogSource, DisplayState, FetchState},
    filters::FilterSnapshot,
    paged::{PageSlot, Pagination},
    query::{SearchRequest, SortOrder, build},
    storage::Storage,
};

/// Keys of the persisted selection.
pub mod storage_keys {
    /// last property type, plain string
    pub const PROPERTY_TYPE: &str = "catalog.propertyType";
    /// last applied filter snapshot, JSON
    pub const FILTERS: &str = "catalog.filters";
    /// last sort order, e.g. `precio-asc`
    pub const SORT: &str = "catalog.sort";

    pub const ALL: [&str; 3] = [PROPERTY_TYPE, FILTERS, SORT];
}

/// Initial values, used where nothing valid is persisted.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub property_type: String,
    pub page_size: u32,
    pub sort: SortOrder,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            property_type: "finca".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::default(),
        }
    }
}

impl ControllerSettings {
    pub fn property_type(self, property_type: impl Into<String>) -> Self {
        Self {
            property_type: property_type.into(),
            ..self
        }
    }

    pub fn page_size(self, page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..self
        }
    }

    pub fn sort(self, sort: SortOrder) -> Self {
        Self { sort, ..self }
    }
}

#[derive(Debug, Clone)]
struct Selection {
    property_type: String,
    filters: FilterSnapshot,
    search_term: String,
    sort: SortOrder,
    page_size: u32,
    pagination: Pagination,
}

/// Owner of the catalog page state.
pub struct CatalogController<S, K> {
    source: S,
    storage: K,
    selection: Mutex<Selection>,
    fetcher: CatalogFetcher,
}

impl<S, K: std::fmt::Debug> std::fmt::Debug for CatalogController<S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogController")
            .field("storage", &self.storage)
            .field("selection", &*self.selection.lock())
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl<S: CatalogSource, K: Storage> CatalogController<S, K> {
    /// Creates a controller, restoring the persisted selection from `storage`.
    ///
    /// Missing or invalid stored values fall back to `settings`; invalid ones
    /// are logged. Nothing is fetched until [`refresh`](Self::refresh).
    pub fn new(source: S, storage: K, settings: ControllerSettings) -> Self {
        let mut selection = Selection {
            property_type: settings.property_type,
            filters: FilterSnapshot::default(),
            search_term: String::new(),
            sort: settings.sort,
            page_size: settings.page_size.max(1),
            pagination: Pagination::default(),
        };

        if let Some(property_type) = read_key(&storage, storage_keys::PROPERTY_TYPE) {
            if property_type.trim().is_empty() {
                warn!(key = storage_keys::PROPERTY_TYPE, "ignoring empty stored property type");
            } else {
                selection.property_type = property_type;
            }
        }
        if let Some(json) = read_key(&storage, storage_keys::FILTERS) {
            match serde_json::from_str::<FilterSnapshot>(&json) {
                Ok(filters) => selection.filters = filters,
                Err(e) => warn!(key = storage_keys::FILTERS, error = %e, "ignoring invalid stored filters"),
            }
        }
        if let Some(sort) = read_key(&storage, storage_keys::SORT) {
            match sort.parse::<SortOrder>() {
                Ok(sort) => selection.sort = sort,
                Err(_) => warn!(key = storage_keys::SORT, value = %sort, "ignoring invalid stored sort"),
            }
        }
        debug!(
            property_type = %selection.property_type,
            filters = selection.filters.active_count(),
            sort = %selection.sort,
            "catalog selection restored"
        );

        Self {
            source,
            storage,
            selection: Mutex::new(selection),
            fetcher: CatalogFetcher::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }

    pub fn fetcher(&self) -> &CatalogFetcher {
        &self.fetcher
    }

    // ------------------------------------------------------------------
    // selection changes
    // ------------------------------------------------------------------

    pub fn set_property_type(&self, property_type: impl Into<String>) {
        let property_type = property_type.into();
        self.change(|sel| sel.property_type.clone_from(&property_type));
        self.persist(storage_keys::PROPERTY_TYPE, &property_type);
    }

    /// Replaces the filter snapshot ("apply filters").
    pub fn apply_filters(&self, filters: FilterSnapshot) {
        let json = serde_json::to_string(&filters);
        self.change(|sel| sel.filters = filters);
        match json {
            Ok(json) => self.persist(storage_keys::FILTERS, &json),
            Err(e) => warn!(error = %e, "filters not persisted"),
        }
    }

    /// Replaces the filters with the canonical empty snapshot.
    pub fn reset_filters(&self) {
        self.apply_filters(FilterSnapshot::reset());
    }

    /// Sets the free-text search. Surrounding whitespace is removed;
    /// a blank term clears the search.
    pub fn set_search_term(&self, term: impl AsRef<str>) {
        let term = term.as_ref().trim().to_string();
        self.change(|sel| sel.search_term = term);
    }

    pub fn set_sort(&self, sort: SortOrder) {
        self.change(|sel| sel.sort = sort);
        self.persist(storage_keys::SORT, &sort.to_string());
    }

    pub fn set_page_size(&self, page_size: u32) {
        self.change(|sel| sel.page_size = page_size.max(1));
    }

    /// Moves to `page`, clamped to the page count of the last result.
    /// Returns the page the next refresh will fetch.
    pub fn go_to(&self, page: u32) -> u32 {
        self.selection.lock().pagination.go_to(page)
    }

    // ------------------------------------------------------------------
    // fetching
    // ------------------------------------------------------------------

    /// Builds the request for the current selection and page.
    pub fn search_request(&self) -> SearchRequest {
        let sel = self.selection.lock();
        build(
            &sel.filters,
            sel.property_type.clone(),
            sel.pagination.current(),
            sel.page_size,
            sel.sort,
            Some(sel.search_term.as_str()),
        )
    }

    /// Runs one sequenced fetch for the current selection.
    ///
    /// If the response is applied and successful, its page count is recorded
    /// in the pagination. Returns the fetch state after completion.
    pub async fn refresh(&self) -> FetchState {
        let request = self.search_request();
        let ticket = self.fetcher.begin();
        debug!(seq = ticket.seq(), page = request.page, "catalog refresh");
        let result = self.source.search(&request).await;
        if self.fetcher.complete(ticket, result)
            && let Some(page) = self.fetcher.page()
        {
            self.selection.lock().pagination.set_total_pages(page.total_pages);
            info!(
                items = page.len(),
                total = page.total_results,
                page = page.current_page,
                pages = page.total_pages,
                "catalog results"
            );
        }
        self.fetcher.state()
    }

    // ------------------------------------------------------------------
    // read accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> FetchState {
        self.fetcher.state()
    }

    pub fn display_state(&self) -> DisplayState {
        self.fetcher.display()
    }

    pub fn page_window(&self) -> Vec<PageSlot> {
        self.selection.lock().pagination.window()
    }

    /// Pagination controls are shown only for multi-page results.
    pub fn show_pagination(&self) -> bool {
        self.selection.lock().pagination.is_visible()
    }

    pub fn pagination(&self) -> Pagination {
        self.selection.lock().pagination
    }

    pub fn current_page(&self) -> u32 {
        self.selection.lock().pagination.current()
    }

    pub fn filters(&self) -> FilterSnapshot {
        self.selection.lock().filters.clone()
    }

    pub fn property_type(&self) -> String {
        self.selection.lock().property_type.clone()
    }

    pub fn search_term(&self) -> String {
        self.selection.lock().search_term.clone()
    }

    pub fn sort(&self) -> SortOrder {
        self.selection.lock().sort
    }

    pub fn page_size(&self) -> u32 {
        self.selection.lock().page_size
    }

    // apply a selection change and go back to the first page
    fn change(&self, update: impl FnOnce(&mut Selection)) {
        let mut sel = self.selection.lock();
        update(&mut sel);
        sel.pagination.reset();
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            warn!(key, error = %e, "could not persist catalog selection");
        }
    }
}

fn read_key<K: Storage>(storage: &K, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "could not read persisted catalog selection");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Arc};

    use tokio::sync::oneshot;

    use super::*;
    use crate::{
        Result,
        error::{CatalogError, StorageError},
        filters::{FilterField, SetField},
        listings::{CatalogPage, PropertyListing},
        storage::MemoryStorage,
    };

    fn listing(id: &str) -> PropertyListing {
        serde_json::from_value(serde_json::json!({ "id": id })).expect("listing")
    }

    fn page(ids: &[&str], total_pages: u32, current_page: u32) -> CatalogPage {
        CatalogPage {
            items: ids.iter().map(|id| listing(id)).collect(),
            total_results: u64::from(total_pages) * 12,
            total_pages,
            current_page,
        }
    }

    /// Answers every search with a fixed page count, recording requests.
    #[derive(Default)]
    struct FakeSource {
        total_pages: u32,
        requests: parking_lot::Mutex<Vec<SearchRequest>>,
    }

    impl FakeSource {
        fn with_pages(total_pages: u32) -> Self {
            Self {
                total_pages,
                ..Default::default()
            }
        }

        fn last_request(&self) -> SearchRequest {
            self.requests.lock().last().cloned().expect("a request")
        }
    }

    impl CatalogSource for FakeSource {
        async fn search(&self, request: &SearchRequest) -> Result<CatalogPage> {
            self.requests.lock().push(request.clone());
            Ok(page(&["x"], self.total_pages, request.page))
        }
    }

    /// Each search waits for a response handed in by the test.
    #[derive(Default)]
    struct ManualSource {
        pending: parking_lot::Mutex<VecDeque<oneshot::Receiver<Result<CatalogPage>>>>,
    }

    impl ManualSource {
        fn expect_request(&self) -> oneshot::Sender<Result<CatalogPage>> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().push_back(rx);
            tx
        }
    }

    impl CatalogSource for ManualSource {
        async fn search(&self, _request: &SearchRequest) -> Result<CatalogPage> {
            let rx = self.pending.lock().pop_front().expect("unexpected request");
            rx.await.unwrap_or_else(|_| {
                Err(CatalogError::Other {
                    message: "dropped".into(),
                })
            })
        }
    }

    #[derive(Debug)]
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::External {
                message: "unavailable".into(),
            })
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::External {
                message: "read-only".into(),
            })
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    type Ctl = CatalogController<FakeSource, Arc<MemoryStorage>>;

    fn controller(total_pages: u32) -> Ctl {
        CatalogController::new(
            FakeSource::with_pages(total_pages),
            Arc::new(MemoryStorage::new()),
            ControllerSettings::default(),
        )
    }

    #[tokio::test]
    #[test_log::test]
    async fn applying_filters_returns_to_first_page() {
        let ctl = controller(10);
        ctl.refresh().await;
        assert_eq!(ctl.go_to(7), 7);
        ctl.refresh().await;
        assert_eq!(ctl.source().last_request().page, 7);

        ctl.apply_filters(FilterSnapshot::default().toggle(SetField::Crops, "cafe"));
        assert_eq!(ctl.current_page(), 1);
        ctl.refresh().await;
        let request = ctl.source().last_request();
        assert_eq!(request.page, 1);
        assert!(request.filters.contains(SetField::Crops, "cafe"));
    }

    #[tokio::test]
    #[test_log::test]
    async fn every_selection_change_resets_page() {
        let ctl = controller(10);
        ctl.refresh().await;
        let changes: Vec<Box<dyn Fn(&Ctl)>> = vec![
            Box::new(|c: &Ctl| c.set_property_type("lote")),
            Box::new(|c: &Ctl| c.reset_filters()),
            Box::new(|c: &Ctl| c.set_search_term("casa")),
            Box::new(|c: &Ctl| c.set_sort(SortOrder::PriceAsc)),
            Box::new(|c: &Ctl| c.set_page_size(24)),
        ];
        for change in changes {
            ctl.go_to(5);
            assert_eq!(ctl.current_page(), 5);
            change(&ctl);
            assert_eq!(ctl.current_page(), 1);
        }
    }

    #[tokio::test]
    #[test_log::test]
    async fn go_to_clamps_to_known_pages() {
        let ctl = controller(4);
        // nothing fetched yet: a single page
        assert_eq!(ctl.go_to(3), 1);
        assert!(!ctl.show_pagination());
        ctl.refresh().await;
        assert!(ctl.show_pagination());
        assert_eq!(ctl.go_to(0), 1);
        assert_eq!(ctl.go_to(99), 4);
        assert_eq!(
            ctl.page_window(),
            vec![PageSlot::Page(1), PageSlot::Gap, PageSlot::Page(3), PageSlot::Page(4)]
        );
    }

    #[tokio::test]
    #[test_log::test]
    async fn search_term_is_trimmed_and_blank_is_omitted() {
        let ctl = controller(1);
        ctl.set_search_term("  finca cafetera ");
        assert_eq!(ctl.search_request().search_term.as_deref(), Some("finca cafetera"));
        ctl.set_search_term("   ");
        assert_eq!(ctl.search_request().search_term, None);
    }

    #[test]
    fn selection_is_persisted_and_restored() {
        let storage = Arc::new(MemoryStorage::new());
        let filters = FilterSnapshot::default()
            .update(FilterField::Municipality, "Piedecuesta")
            .toggle(SetField::UseTypes, "agricola");
        {
            let ctl = CatalogController::new(
                FakeSource::default(),
                storage.clone(),
                ControllerSettings::default(),
            );
            ctl.set_property_type("casa-campestre");
            ctl.apply_filters(filters.clone());
            ctl.set_sort(SortOrder::AreaAsc);
            ctl.set_search_term("lago");
        }

        let restored =
            CatalogController::new(FakeSource::default(), storage, ControllerSettings::default());
        assert_eq!(restored.property_type(), "casa-campestre");
        assert_eq!(restored.filters(), filters);
        assert_eq!(restored.sort(), SortOrder::AreaAsc);
        // search term is not persisted
        assert_eq!(restored.search_term(), "");
        assert_eq!(restored.current_page(), 1);
    }

    #[test]
    fn invalid_persisted_values_are_ignored() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(storage_keys::FILTERS, "{not json").expect("set");
        storage.set(storage_keys::SORT, "cheapest").expect("set");
        storage.set(storage_keys::PROPERTY_TYPE, "").expect("set");
        let settings = ControllerSettings::default()
            .property_type("lote")
            .sort(SortOrder::PriceDesc);
        let ctl = CatalogController::new(FakeSource::default(), storage, settings);
        assert_eq!(ctl.property_type(), "lote");
        assert_eq!(ctl.sort(), SortOrder::PriceDesc);
        assert!(ctl.filters().is_empty());
    }

    #[tokio::test]
    #[test_log::test]
    async fn storage_failures_do_not_block_changes() {
        let ctl = CatalogController::new(
            FakeSource::with_pages(2),
            BrokenStorage,
            ControllerSettings::default(),
        );
        ctl.set_sort(SortOrder::PriceDesc);
        ctl.apply_filters(FilterSnapshot::default().with_electricity(true));
        let state = ctl.refresh().await;
        assert_eq!(state.display(), DisplayState::Results);
        assert_eq!(ctl.source().last_request().sort, SortOrder::PriceDesc);
    }

    #[tokio::test]
    #[test_log::test]
    async fn overlapping_refresh_keeps_latest_request() {
        let source = ManualSource::default();
        let tx_a = source.expect_request();
        let tx_b = source.expect_request();
        let ctl = CatalogController::new(
            source,
            MemoryStorage::new(),
            ControllerSettings::default(),
        );

        let respond = async {
            // B answers first, then the stale A
            let _ = tx_b.send(Ok(page(&["b"], 2, 1)));
            tokio::task::yield_now().await;
            let _ = tx_a.send(Ok(page(&["a1", "a2"], 9, 1)));
        };
        let (state_a, state_b, ()) = tokio::join!(ctl.refresh(), ctl.refresh(), respond);

        let applied = ctl.fetcher().page().expect("page");
        assert_eq!(applied.items[0].id, "b");
        assert_eq!(ctl.pagination().total_pages(), 2);
        // both callers observe the latest state
        assert_eq!(state_a, state_b);
    }

    #[tokio::test]
    #[test_log::test]
    async fn failed_refresh_shows_no_results() {
        let source = ManualSource::default();
        let tx_ok = source.expect_request();
        let tx_err = source.expect_request();
        let ctl = CatalogController::new(source, MemoryStorage::new(), ControllerSettings::default());

        tx_ok.send(Ok(page(&["a"], 3, 1))).expect("send");
        ctl.refresh().await;
        assert_eq!(ctl.display_state(), DisplayState::Results);

        tx_err
            .send(Err(CatalogError::ApiError {
                code: 503,
                method: "GET".into(),
                url: "/terrains".into(),
                message: "unavailable".into(),
            }))
            .expect("send");
        let state = ctl.refresh().await;
        assert!(matches!(state, FetchState::Error(ref f) if f.status == Some(503)));
        assert_eq!(ctl.display_state(), DisplayState::NoResults);
        // page count of the last good result is kept
        assert_eq!(ctl.pagination().total_pages(), 3);
    }
}
