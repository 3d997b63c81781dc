//! Facet vocabularies
//!
//! The values offered for each multi-select facet (soil types, water sources, ...)
//! come from `GET /configuration/{category}`. [`Vocabulary`] fetches each
//! category at most once per load and keeps it until [`Vocabulary::refresh`].
//!
//! Selections are not validated against the vocabulary when searching;
//! [`Vocabulary::unknown_values`] lets a caller warn about them.

use std::collections::HashMap;

use futures::future::try_join_all;
use parking_lot::Mutex;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::{Result, filters::FilterSnapshot, filters::SetField};

/// Configuration categories served by the catalog.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "camelCase")]
pub enum FacetCategory {
    PastureTypes,
    WaterSources,
    TopographyTypes,
    SoilTypes,
    UseTypes,
}

impl FacetCategory {
    /// The filter field whose values come from this category.
    pub fn set_field(self) -> SetField {
        match self {
            Self::PastureTypes => SetField::PastureTypes,
            Self::WaterSources => SetField::WaterSources,
            Self::TopographyTypes => SetField::TopographyTypes,
            Self::SoilTypes => SetField::SoilTypes,
            Self::UseTypes => SetField::UseTypes,
        }
    }
}

/// Source of facet vocabularies. Implemented by [`CatalogClient`](crate::client::CatalogClient).
#[allow(async_fn_in_trait)]
pub trait OptionsSource {
    async fn options(&self, category: FacetCategory) -> Result<Vec<String>>;
}

impl<T: OptionsSource> OptionsSource for &T {
    async fn options(&self, category: FacetCategory) -> Result<Vec<String>> {
        (**self).options(category).await
    }
}

/// Caching repository of facet vocabularies.
#[derive(Debug)]
pub struct Vocabulary<O> {
    source: O,
    cache: Mutex<HashMap<FacetCategory, Vec<String>>>,
}

impl<O: OptionsSource> Vocabulary<O> {
    pub fn new(source: O) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the options of `category`, fetching them on first use.
    ///
    /// A failed fetch is not cached; the next call tries again.
    pub async fn get_options(&self, category: FacetCategory) -> Result<Vec<String>> {
        if let Some(values) = self.cache.lock().get(&category) {
            return Ok(values.clone());
        }
        let values = self.source.options(category).await?;
        debug!(%category, count = values.len(), "loaded facet options");
        self.cache.lock().insert(category, values.clone());
        Ok(values)
    }

    /// Loads every category, concurrently. Fails if any category fails;
    /// the ones that succeeded stay cached.
    pub async fn load_all(&self) -> Result<Vec<(FacetCategory, Vec<String>)>> {
        try_join_all(FacetCategory::iter().map(|category| async move {
            self.get_options(category)
                .await
                .map(|values| (category, values))
        }))
        .await
    }

    /// Loads the categories that have a selection in `filters`.
    /// Stops at the first failure; categories loaded before it stay cached.
    pub async fn load_selected(&self, filters: &FilterSnapshot) -> Result<()> {
        for category in FacetCategory::iter() {
            if !filters.values(category.set_field()).is_empty() {
                self.get_options(category).await?;
            }
        }
        Ok(())
    }

    /// Drops all cached vocabularies so the next lookup fetches again.
    pub fn refresh(&self) {
        self.cache.lock().clear();
    }

    /// Returns the cached options for `category` without fetching.
    pub fn cached(&self, category: FacetCategory) -> Option<Vec<String>> {
        self.cache.lock().get(&category).cloned()
    }

    /// Selected values not present in their (already loaded) vocabulary.
    ///
    /// Categories that have not been loaded are skipped. Crops have no
    /// vocabulary endpoint and are never reported.
    pub fn unknown_values(&self, filters: &FilterSnapshot) -> Vec<(SetField, String)> {
        let cache = self.cache.lock();
        let mut unknown = Vec::new();
        for category in FacetCategory::iter() {
            let Some(known) = cache.get(&category) else {
                continue;
            };
            let field = category.set_field();
            for value in filters.values(field) {
                if !known.iter().any(|k| k == value) {
                    unknown.push((field, value.clone()));
                }
            }
        }
        unknown
    }
}
