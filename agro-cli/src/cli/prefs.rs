use agro_catalog::prelude::*;
use anyhow::Result;
use serde_json::{Map, Value};

use crate::cli::{AppContext, PrefsCommands};

pub fn handle(ctx: &AppContext, command: PrefsCommands) -> Result<()> {
    match command {
        PrefsCommands::Show => ctx.output.emit_json(&stored_selection(ctx.storage.as_ref())?),
        PrefsCommands::Reset => {
            for key in storage_keys::ALL {
                ctx.storage.remove(key)?;
            }
            ctx.output.emit_text("selection cleared")
        }
    }
}

/// Persisted keys as json. The filters value is expanded when it parses.
fn stored_selection(storage: &dyn Storage) -> Result<Map<String, Value>> {
    let mut selection = Map::new();
    for key in storage_keys::ALL {
        let Some(raw) = storage.get(key)? else {
            continue;
        };
        let value = if key == storage_keys::FILTERS {
            serde_json::from_str(&raw).unwrap_or(Value::String(raw))
        } else {
            Value::String(raw)
        };
        selection.insert(key.to_string(), value);
    }
    Ok(selection)
}
