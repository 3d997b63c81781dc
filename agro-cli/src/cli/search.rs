use agro_catalog::prelude::*;
use anyhow::{Result, bail};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{AppContext, SearchArgs};

/// Json output of `agro search`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput<'a> {
    property_type: String,
    sort: SortOrder,
    #[serde(skip_serializing_if = "String::is_empty")]
    search: String,
    filters: FilterSnapshot,
    results: &'a CatalogPage,
    pages: Vec<PageSlot>,
}

pub async fn handle(ctx: &AppContext, args: SearchArgs) -> Result<()> {
    let controller = ctx.controller();

    if let Some(property_type) = &args.property_type {
        controller.set_property_type(property_type.trim());
    }
    if let Some(sort) = args.sort {
        controller.set_sort(sort.to_sort());
    }
    if let Some(text) = &args.text {
        controller.set_search_term(text);
    }

    let base = if args.reset {
        FilterSnapshot::reset()
    } else {
        controller.filters()
    };
    let filters = apply_overrides(&base, &args);
    if args.reset || filters != controller.filters() {
        controller.apply_filters(filters.clone());
    }
    warn_unknown_values(ctx, &filters).await;

    let mut state = controller.refresh().await;
    if let Some(page) = args.page.filter(|page| *page > 1)
        && matches!(state, FetchState::Success(_))
    {
        let target = controller.go_to(page);
        if target != page {
            warn!(requested = page, showing = target, "page out of range");
        }
        if target > 1 {
            state = controller.refresh().await;
        }
    }

    let page = match state {
        FetchState::Success(page) => page,
        FetchState::Error(failure) => bail!("catalog search failed: {failure}"),
        FetchState::Idle | FetchState::Loading => bail!("catalog search did not complete"),
    };

    if ctx.output.is_table() {
        if page.is_empty() {
            let hint = if filters.is_empty() {
                ""
            } else {
                " (try --reset)"
            };
            return ctx.output.emit_text(&format!("no results{hint}"));
        }
        ctx.output.emit_table(&page.items)?;
        let mut summary = format!("{} results", page.total_results);
        if controller.show_pagination() {
            summary.push_str(" | pages: ");
            summary.push_str(&format_window(&controller.page_window(), page.current_page));
        }
        return ctx.output.emit_text(&summary);
    }

    ctx.output.emit_json(&SearchOutput {
        property_type: controller.property_type(),
        sort: controller.sort(),
        search: controller.search_term(),
        filters,
        results: &page,
        pages: controller.page_window(),
    })
}

/// Applies the command line filters on top of `base`.
/// A facet given on the command line replaces the stored facet.
pub fn apply_overrides(base: &FilterSnapshot, args: &SearchArgs) -> FilterSnapshot {
    let mut filters = base.clone();
    let text_fields = [
        (FilterField::Municipality, &args.municipality),
        (FilterField::PriceMin, &args.price_min),
        (FilterField::PriceMax, &args.price_max),
        (FilterField::AreaMin, &args.area_min),
        (FilterField::AreaMax, &args.area_max),
    ];
    for (field, value) in text_fields {
        if let Some(value) = value {
            filters = filters.update(field, value.trim());
        }
    }
    for (field, values) in facet_args(args) {
        if !values.is_empty() {
            let values = values.iter().map(|v| v.trim()).filter(|v| !v.is_empty());
            filters = filters.with_values(field, values);
        }
    }
    if let Some(has_electricity) = args.electricity {
        filters = filters.with_electricity(has_electricity);
    }
    filters
}

fn facet_args(args: &SearchArgs) -> [(SetField, &Vec<String>); 6] {
    [
        (SetField::SoilTypes, &args.soil),
        (SetField::WaterSources, &args.water),
        (SetField::PastureTypes, &args.pasture),
        (SetField::Crops, &args.crop),
        (SetField::TopographyTypes, &args.topography),
        (SetField::UseTypes, &args.use_types),
    ]
}

// selections are sent as given; values outside the vocabulary only get a warning
async fn warn_unknown_values(ctx: &AppContext, filters: &FilterSnapshot) {
    let vocabulary = Vocabulary::new(&ctx.client);
    if let Err(e) = vocabulary.load_selected(filters).await {
        debug!(error = %e, "facet options unavailable");
    }
    for (field, value) in vocabulary.unknown_values(filters) {
        warn!(%field, %value, "value is not in the catalog vocabulary");
    }
}

fn format_window(window: &[PageSlot], current: u32) -> String {
    window
        .iter()
        .map(|slot| match slot {
            PageSlot::Page(n) if *n == current => format!("[{n}]"),
            slot => slot.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
