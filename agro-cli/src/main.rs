/*
 * agro - search the agro property catalog from the command line
 *
 * SPDX-FileCopyrightText: 2025-2026 Agro Catalog contributors
 * SPDX-License-Identifier: Apache-2.0
 */
#![warn(clippy::pedantic)] // experimental
#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::must_use_candidate)] // pedantic
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::option_if_let_else)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unused_async)]

mod cli;
mod output;

use agro_catalog::prelude::CatalogError;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(exit_code(&err));
    }
}

async fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose)?;
    cli::run(cli).await
}

// 2: auth, 3: not found, 1: anything else
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CatalogError>() {
        Some(CatalogError::Unauthorized | CatalogError::Forbidden) => 2,
        Some(CatalogError::NotFound { .. }) => 3,
        _ => 1,
    }
}

#[allow(clippy::unnecessary_wraps)]
fn init_tracing(verbose: u8) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = std::env::var("RUST_LOG").map_or_else(
        |_| {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(level)
        },
        EnvFilter::new,
    );

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    Ok(())
}
