//! Filter state for the property catalog
//!
//! A [`FilterSnapshot`] is an immutable value capturing the filter panel at a point in time.
//! Every edit returns a new snapshot; the owner swaps it in on "apply".
//!
//! ```rust
//! use agro_catalog::prelude::*;
//!
//! let filters = FilterSnapshot::default()
//!     .update(FilterField::Municipality, "Bucaramanga")
//!     .update(FilterField::PriceMax, "450000000")
//!     .toggle(SetField::SoilTypes, "arenoso")
//!     .with_electricity(true);
//! assert_eq!(filters.active_count(), 4);
//!
//! // toggling twice is a no-op
//! let same = filters.toggle(SetField::Crops, "cafe").toggle(SetField::Crops, "cafe");
//! assert_eq!(same, filters);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Scalar text fields of the filter panel.
///
/// Numeric fields keep the raw text typed by the user; validation is left
/// to the catalog endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum FilterField {
    Municipality,
    PriceMin,
    PriceMax,
    AreaMin,
    AreaMax,
}

/// Multi-select (facet) fields of the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum SetField {
    SoilTypes,
    WaterSources,
    PastureTypes,
    Crops,
    TopographyTypes,
    UseTypes,
}

/// Current filter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSnapshot {
    /// empty = any municipality
    pub municipality: String,
    pub price_min: String,
    pub price_max: String,
    pub area_min: String,
    pub area_max: String,
    pub soil_types: BTreeSet<String>,
    pub water_sources: BTreeSet<String>,
    pub pasture_types: BTreeSet<String>,
    pub crops: BTreeSet<String>,
    pub topography_types: BTreeSet<String>,
    pub use_types: BTreeSet<String>,
    pub has_electricity: bool,
}

impl FilterSnapshot {
    /// Returns the canonical empty snapshot.
    #[must_use]
    pub fn reset() -> Self {
        Self::default()
    }

    /// Returns a new snapshot with exactly `field` replaced.
    #[must_use]
    pub fn update(&self, field: FilterField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        *next.text_mut(field) = value.into();
        next
    }

    /// Returns a new snapshot with `value` added to `field` if absent, removed if present.
    #[must_use]
    pub fn toggle(&self, field: SetField, value: impl Into<String>) -> Self {
        let value = value.into();
        let mut next = self.clone();
        let set = next.set_mut(field);
        if !set.remove(&value) {
            set.insert(value);
        }
        next
    }

    /// Returns a new snapshot with the whole facet replaced.
    #[must_use]
    pub fn with_values<S: Into<String>>(
        &self,
        field: SetField,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut next = self.clone();
        *next.set_mut(field) = values.into_iter().map(Into::into).collect();
        next
    }

    /// Returns a new snapshot with the electricity flag set.
    #[must_use]
    pub fn with_electricity(&self, has_electricity: bool) -> Self {
        Self {
            has_electricity,
            ..self.clone()
        }
    }

    pub fn text(&self, field: FilterField) -> &str {
        match field {
            FilterField::Municipality => &self.municipality,
            FilterField::PriceMin => &self.price_min,
            FilterField::PriceMax => &self.price_max,
            FilterField::AreaMin => &self.area_min,
            FilterField::AreaMax => &self.area_max,
        }
    }

    pub fn values(&self, field: SetField) -> &BTreeSet<String> {
        match field {
            SetField::SoilTypes => &self.soil_types,
            SetField::WaterSources => &self.water_sources,
            SetField::PastureTypes => &self.pasture_types,
            SetField::Crops => &self.crops,
            SetField::TopographyTypes => &self.topography_types,
            SetField::UseTypes => &self.use_types,
        }
    }

    /// Returns true if `value` is selected in `field`.
    pub fn contains(&self, field: SetField, value: &str) -> bool {
        self.values(field).contains(value)
    }

    /// Number of constrained fields. Zero means the snapshot is unconstrained.
    pub fn active_count(&self) -> usize {
        use strum::IntoEnumIterator;
        let text = FilterField::iter()
            .filter(|field| !self.text(*field).is_empty())
            .count();
        let sets = SetField::iter()
            .filter(|field| !self.values(*field).is_empty())
            .count();
        text + sets + usize::from(self.has_electricity)
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    fn text_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Municipality => &mut self.municipality,
            FilterField::PriceMin => &mut self.price_min,
            FilterField::PriceMax => &mut self.price_max,
            FilterField::AreaMin => &mut self.area_min,
            FilterField::AreaMax => &mut self.area_max,
        }
    }

    fn set_mut(&mut self, field: SetField) -> &mut BTreeSet<String> {
        match field {
            SetField::SoilTypes => &mut self.soil_types,
            SetField::WaterSources => &mut self.water_sources,
            SetField::PastureTypes => &mut self.pasture_types,
            SetField::Crops => &mut self.crops,
            SetField::TopographyTypes => &mut self.topography_types,
            SetField::UseTypes => &mut self.use_types,
        }
    }
}
