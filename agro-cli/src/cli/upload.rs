use agro_catalog::prelude::*;
use anyhow::{Context, Result, bail};

use crate::cli::{AppContext, UploadArgs};

pub async fn handle(ctx: &AppContext, args: UploadArgs) -> Result<()> {
    if !ctx.client.is_authenticated() {
        bail!("media upload needs a token: use --token or set AGRO_CATALOG_TOKEN");
    }

    // read everything first so a missing file fails before anything is uploaded
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(MediaFile::from_path(path).await?);
    }

    let kind = args.kind.to_kind();
    let batch = upload_batch(&ctx.client, kind, &files).await;
    ctx.output.emit_table(&batch.uploaded)?;

    match batch.failure {
        None => Ok(()),
        Some((file, err)) => Err(err).with_context(|| {
            format!(
                "upload of {file} failed after {} of {} files",
                batch.uploaded.len(),
                files.len()
            )
        }),
    }
}
