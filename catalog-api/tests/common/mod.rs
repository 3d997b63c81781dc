//! Mock catalog server for integration tests
//!
//! An axum app serving the catalog endpoints from in-memory data:
//! - `GET /api/terrains` filters by propertyType, municipality and soilTypes, then pages
//! - `GET /api/terrains/{id}`
//! - `GET /api/configuration/{category}`
//! - `POST /api/media/{kind}` requires `Authorization: Bearer <token>`
//!
//! Every search query is recorded so tests can assert on the exact parameters sent.
#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use agro_catalog::prelude::*;
use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};

pub const TEST_TOKEN: &str = "test-token-123";

/// Data served by the mock, and what it observed.
#[derive(Debug, Default)]
pub struct MockData {
    pub listings: Vec<Value>,
    pub options: HashMap<String, Vec<String>>,
    /// when set, searches answer with this status
    pub search_status: Option<u16>,
    /// uploads of this file name fail with 500
    pub fail_upload: Option<String>,
    pub queries: Vec<Vec<(String, String)>>,
    /// (kind, file name, size, content type)
    pub uploads: Vec<(String, String, usize, String)>,
}

#[derive(Clone, Default)]
pub struct MockState(Arc<Mutex<MockData>>);

impl MockState {
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, MockData> {
        self.0.lock()
    }

    pub fn last_query(&self) -> Vec<(String, String)> {
        self.0.lock().queries.last().cloned().unwrap_or_default()
    }
}

pub struct MockCatalog {
    pub base_url: String,
    pub state: MockState,
    handle: JoinHandle<()>,
}

impl Drop for MockCatalog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl MockCatalog {
    /// Starts the mock on a free local port.
    pub async fn start(data: MockData) -> anyhow::Result<Self> {
        let state = MockState(Arc::new(Mutex::new(data)));
        let app = Router::new()
            .route("/api/terrains", get(search))
            .route("/api/terrains/{id}", get(detail))
            .route("/api/configuration/{category}", get(options))
            .route("/api/media/{kind}", post(upload))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("mock catalog server: {e}");
            }
        });
        Ok(Self {
            base_url: format!("http://{addr}/api"),
            state,
            handle,
        })
    }

    /// Starts the mock with [`sample_data`].
    pub async fn start_sample() -> anyhow::Result<Self> {
        Self::start(sample_data()).await
    }

    pub fn client(&self) -> anyhow::Result<CatalogClient> {
        Ok(CatalogClient::with_config(
            ClientConfig::default().base_url(&self.base_url),
        )?)
    }
}

/// 30 fincas in Bucaramanga (every third on sandy soil), 5 in Lebrija, 3 lotes in Giron.
pub fn sample_data() -> MockData {
    let mut listings = Vec::new();
    for n in 0..30 {
        let soil = if n % 3 == 0 { "arenoso" } else { "arcilloso" };
        listings.push(json!({
            "_id": format!("finca-bga-{n:02}"),
            "propertyType": "finca",
            "title": format!("Finca {n} Bucaramanga"),
            "price": 300_000_000 + n * 10_000_000,
            "area": 5.0 + f64::from(n),
            "location": {"municipality": "Bucaramanga", "department": "Santander"},
            "soilTypes": [soil],
            "hasElectricity": n % 2 == 0,
        }));
    }
    for n in 0..5 {
        listings.push(json!({
            "_id": format!("finca-leb-{n}"),
            "propertyType": "finca",
            "title": format!("Finca {n} Lebrija"),
            "location": {"municipality": "Lebrija", "department": "Santander"},
            "soilTypes": ["arenoso"],
        }));
    }
    for n in 0..3 {
        listings.push(json!({
            "_id": format!("lote-giron-{n}"),
            "propertyType": "lote",
            "title": format!("Lote {n} Giron"),
            "area": 1.5,
            "location": {"municipality": "Giron", "department": "Santander"},
        }));
    }

    let options = [
        ("soilTypes", vec!["arcilloso", "arenoso", "limoso"]),
        ("waterSources", vec!["aljibe", "pozo", "quebrada", "rio"]),
        ("pastureTypes", vec!["brachiaria", "kikuyo"]),
        ("topographyTypes", vec!["plana", "ondulada", "quebrada"]),
        ("useTypes", vec!["agricola", "ganaderia", "turismo"]),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
    .collect();

    MockData {
        listings,
        options,
        ..Default::default()
    }
}

fn param<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn matches(listing: &Value, query: &[(String, String)]) -> bool {
    if let Some(kind) = param(query, "propertyType")
        && listing["propertyType"] != kind
    {
        return false;
    }
    if let Some(municipality) = param(query, "municipality")
        && listing["location"]["municipality"] != municipality
    {
        return false;
    }
    if let Some(soils) = param(query, "soilTypes") {
        let listed = listing["soilTypes"].as_array().cloned().unwrap_or_default();
        if !soils.split(',').any(|soil| listed.iter().any(|v| v == soil)) {
            return false;
        }
    }
    true
}

async fn search(
    State(state): State<MockState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let mut data = state.lock();
    data.queries.push(query.clone());
    if let Some(code) = data.search_status {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "search unavailable").into_response();
    }

    let page: usize = param(&query, "page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = param(&query, "limit").and_then(|p| p.parse().ok()).unwrap_or(12);
    let found: Vec<&Value> = data.listings.iter().filter(|l| matches(l, &query)).collect();
    let total = found.len();
    let total_pages = total.div_ceil(limit.max(1));
    let items: Vec<&Value> = found
        .into_iter()
        .skip(page.saturating_sub(1) * limit)
        .take(limit)
        .collect();
    Json(json!({
        "terrains": items,
        "total": total,
        "totalPages": total_pages,
    }))
    .into_response()
}

async fn detail(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let data = state.lock();
    match data.listings.iter().find(|l| l["_id"] == id.as_str()) {
        Some(listing) => Json(listing.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "terrain not found").into_response(),
    }
}

async fn options(State(state): State<MockState>, Path(category): Path<String>) -> Response {
    let data = state.lock();
    match data.options.get(&category) {
        Some(values) => Json(values.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "unknown category").into_response(),
    }
}

async fn upload(
    State(state): State<MockState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let expected = format!("Bearer {TEST_TOKEN}");
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "missing or invalid token").into_response();
    }
    if !["image", "video", "image360"].contains(&kind.as_str()) {
        return (StatusCode::NOT_FOUND, "unknown media kind").into_response();
    }

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let Ok(bytes) = field.bytes().await else {
            return (StatusCode::BAD_REQUEST, "unreadable file").into_response();
        };

        let mut data = state.lock();
        if data.fail_upload.as_deref() == Some(file_name.as_str()) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "storage failure").into_response();
        }
        data.uploads
            .push((kind.clone(), file_name.clone(), bytes.len(), content_type));
        return Json(json!({
            "url": format!("https://media.example/{kind}/{file_name}"),
            "public_id": format!("agro/{kind}/{file_name}"),
        }))
        .into_response();
    }
    (StatusCode::BAD_REQUEST, "missing file field").into_response()
}
