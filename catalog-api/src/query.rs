//! Query building for the catalog search endpoint
//!
//! [`build`] turns a filter snapshot plus paging, sort and search text into a
//! [`SearchRequest`]. [`SearchRequest::params`] flattens it into the key/value
//! pairs sent as the query string of `GET /terrains`.
//!
//! Rules:
//! - `propertyType`, `page`, `limit` and `sort` are always present
//! - empty text fields and empty facets are omitted
//! - facets are comma-joined in set order
//! - numeric text passes through verbatim; the endpoint is authoritative
//! - `hasElectricity` is sent only when set

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::filters::{FilterField, FilterSnapshot, SetField};

/// Sort orders understood by the catalog endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum SortOrder {
    /// newest first
    #[default]
    #[serde(rename = "recientes")]
    #[strum(serialize = "recientes")]
    Recent,
    #[serde(rename = "precio-asc")]
    #[strum(serialize = "precio-asc")]
    PriceAsc,
    #[serde(rename = "precio-desc")]
    #[strum(serialize = "precio-desc")]
    PriceDesc,
    #[serde(rename = "area-asc")]
    #[strum(serialize = "area-asc")]
    AreaAsc,
}

/// A fully specified catalog search. Built fresh for every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub property_type: String,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortOrder,
    pub search_term: Option<String>,
    pub filters: FilterSnapshot,
}

/// Builds a search request. Page 0 is treated as page 1.
///
/// The search term is not trimmed here; pass `None` or an empty string for no search.
pub fn build(
    snapshot: &FilterSnapshot,
    property_type: impl Into<String>,
    page: u32,
    page_size: u32,
    sort: SortOrder,
    search_term: Option<&str>,
) -> SearchRequest {
    SearchRequest {
        property_type: property_type.into(),
        page: page.max(1),
        page_size,
        sort,
        search_term: search_term
            .filter(|term| !term.is_empty())
            .map(ToString::to_string),
        filters: snapshot.clone(),
    }
}

impl SearchRequest {
    /// Flattens the request into query parameters.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("propertyType".to_string(), self.property_type.clone()),
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.page_size.to_string()),
            ("sort".to_string(), self.sort.to_string()),
        ];

        if let Some(term) = &self.search_term {
            params.push(("search".to_string(), term.clone()));
        }

        for field in FilterField::iter() {
            let value = self.filters.text(field);
            if !value.is_empty() {
                params.push((field.to_string(), value.to_string()));
            }
        }

        for field in SetField::iter() {
            let values = self.filters.values(field);
            if !values.is_empty() {
                let joined = values
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                params.push((field.to_string(), joined));
            }
        }

        if self.filters.has_electricity {
            params.push(("hasElectricity".to_string(), "true".to_string()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_PAGE_SIZE;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn keys(params: &[(String, String)]) -> Vec<&str> {
        params.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn finca_in_bucaramanga_with_soil() {
        let filters = FilterSnapshot::default()
            .update(FilterField::Municipality, "Bucaramanga")
            .toggle(SetField::SoilTypes, "arenoso");
        let request = build(
            &filters,
            "finca",
            1,
            DEFAULT_PAGE_SIZE,
            SortOrder::default(),
            None,
        );
        let params = request.params();

        assert_eq!(param(&params, "propertyType"), Some("finca"));
        assert_eq!(param(&params, "municipality"), Some("Bucaramanga"));
        assert_eq!(param(&params, "soilTypes"), Some("arenoso"));
        assert_eq!(param(&params, "page"), Some("1"));
        assert_eq!(param(&params, "limit"), Some("12"));
        assert_eq!(param(&params, "sort"), Some("recientes"));
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn empty_filters_send_only_paging_keys() {
        let request = build(
            &FilterSnapshot::default(),
            "lote",
            3,
            12,
            SortOrder::PriceDesc,
            Some(""),
        );
        assert_eq!(
            keys(&request.params()),
            vec!["propertyType", "page", "limit", "sort"]
        );
        assert_eq!(param(&request.params(), "sort"), Some("precio-desc"));
    }

    #[test]
    fn empty_facets_are_omitted() {
        let filters = FilterSnapshot::default()
            .toggle(SetField::Crops, "cafe")
            .toggle(SetField::Crops, "cafe")
            .toggle(SetField::PastureTypes, "brachiaria");
        let params = build(&filters, "finca", 1, 12, SortOrder::Recent, None).params();
        for absent in [
            "soilTypes",
            "waterSources",
            "crops",
            "topographyTypes",
            "useTypes",
        ] {
            assert!(param(&params, absent).is_none(), "{absent} should be omitted");
        }
        assert_eq!(param(&params, "pastureTypes"), Some("brachiaria"));
    }

    #[test]
    fn facets_are_comma_joined() {
        let filters = FilterSnapshot::default()
            .toggle(SetField::WaterSources, "rio")
            .toggle(SetField::WaterSources, "aljibe")
            .toggle(SetField::WaterSources, "pozo");
        let params = build(&filters, "finca", 1, 12, SortOrder::Recent, None).params();
        assert_eq!(param(&params, "waterSources"), Some("aljibe,pozo,rio"));
    }

    #[test]
    fn numeric_text_passes_through() {
        let filters = FilterSnapshot::default()
            .update(FilterField::PriceMin, "-5")
            .update(FilterField::PriceMax, "abc")
            .update(FilterField::AreaMin, "900")
            .update(FilterField::AreaMax, "10");
        let params = build(&filters, "finca", 1, 12, SortOrder::AreaAsc, None).params();
        assert_eq!(param(&params, "priceMin"), Some("-5"));
        assert_eq!(param(&params, "priceMax"), Some("abc"));
        // min > max is not corrected
        assert_eq!(param(&params, "areaMin"), Some("900"));
        assert_eq!(param(&params, "areaMax"), Some("10"));
    }

    #[test]
    fn search_and_electricity_are_included_when_set() {
        let filters = FilterSnapshot::default().with_electricity(true);
        let params = build(&filters, "finca", 2, 12, SortOrder::Recent, Some(" casa ")).params();
        assert_eq!(param(&params, "search"), Some(" casa "));
        assert_eq!(param(&params, "hasElectricity"), Some("true"));
    }

    #[test]
    fn page_zero_becomes_one() {
        let request = build(&FilterSnapshot::default(), "finca", 0, 12, SortOrder::Recent, None);
        assert_eq!(request.page, 1);
    }

    #[test]
    fn sort_order_round_trips_through_strings() {
        for sort in SortOrder::iter() {
            let parsed: SortOrder = sort.to_string().parse().expect("parse sort");
            assert_eq!(parsed, sort);
        }
        assert!("masvendidos".parse::<SortOrder>().is_err());
    }
}
