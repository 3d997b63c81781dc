use std::collections::BTreeMap;

use agro_catalog::prelude::*;
use anyhow::Result;

use crate::{
    cli::{AppContext, CategoryArg},
    output::OptionRow,
};

pub async fn handle(ctx: &AppContext, category: Option<CategoryArg>) -> Result<()> {
    let vocabulary = Vocabulary::new(&ctx.client);

    let loaded = match category {
        Some(category) => {
            let category = category.to_category();
            vec![(category, vocabulary.get_options(category).await?)]
        }
        None => vocabulary.load_all().await?,
    };

    if ctx.output.is_table() {
        return ctx.output.emit_table(&option_rows(&loaded));
    }
    match (category, loaded.as_slice()) {
        (Some(_), [(_, values)]) => ctx.output.emit_json(values),
        _ => {
            let by_name: BTreeMap<String, &Vec<String>> = loaded
                .iter()
                .map(|(category, values)| (category.to_string(), values))
                .collect();
            ctx.output.emit_json(&by_name)
        }
    }
}

fn option_rows(loaded: &[(FacetCategory, Vec<String>)]) -> Vec<OptionRow> {
    loaded
        .iter()
        .flat_map(|(category, values)| {
            values.iter().map(move |value| OptionRow {
                category: category.to_string(),
                value: value.clone(),
            })
        })
        .collect()
}
