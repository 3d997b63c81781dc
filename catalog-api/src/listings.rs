//! Catalog listings and search result pages
//!
//! Listings are owned by the catalog service. This crate reads the fields it
//! needs for display and keeps everything else in [`PropertyListing::extra`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Location of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingLocation {
    pub municipality: String,
    pub department: String,
}

/// A property in the catalog (finca, lote, casa campestre, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListing {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub property_type: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub price: Option<f64>,

    /// area in hectares
    #[serde(default)]
    pub area: Option<f64>,

    #[serde(default)]
    pub location: ListingLocation,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Remaining fields, untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of catalog search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub items: Vec<PropertyListing>,
    pub total_results: u64,
    /// always >= 1
    pub total_pages: u32,
    pub current_page: u32,
}

impl CatalogPage {
    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the search matched nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, PropertyListing> {
        self.items.iter()
    }

    /// Pagination controls are only shown for multi-page results.
    pub fn has_more_pages(&self) -> bool {
        self.total_pages > 1
    }
}

impl<'a> IntoIterator for &'a CatalogPage {
    type Item = &'a PropertyListing;
    type IntoIter = std::slice::Iter<'a, PropertyListing>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Wire shape of `GET /terrains`.
///
/// Decoding is permissive: missing arrays are empty, missing counts
/// fall back to 0 results on 1 page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct CatalogResponse {
    pub terrains: Vec<PropertyListing>,
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
}

impl CatalogResponse {
    pub(crate) fn into_page(self, current_page: u32) -> CatalogPage {
        CatalogPage {
            total_results: self.total.unwrap_or(0),
            total_pages: self.total_pages.unwrap_or(1).max(1),
            current_page,
            items: self.terrains,
        }
    }
}
