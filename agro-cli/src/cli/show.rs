use anyhow::Result;

use crate::cli::AppContext;

pub async fn handle(ctx: &AppContext, id: &str) -> Result<()> {
    let listing = ctx.client.listing(id.trim()).await?;
    if ctx.output.is_table() {
        return ctx.output.emit_table(std::slice::from_ref(&listing));
    }
    ctx.output.emit_json(&listing)
}
