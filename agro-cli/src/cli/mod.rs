/*
 * agro - search the agro property catalog from the command line
 *
 * SPDX-FileCopyrightText: 2025-2026 Agro Catalog contributors
 * SPDX-License-Identifier: Apache-2.0
 */
use std::{path::PathBuf, sync::Arc};

use agro_catalog::prelude::*;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};

use crate::output::{Output, OutputFormat};

pub mod options;
pub mod prefs;
pub mod search;
pub mod show;
pub mod upload;


#[derive(Parser, Debug)]
#[command(name = "agro")]
#[command(author, version, about = "agro: search the agro property catalog", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Catalog API URL. Default: environment `AGRO_CATALOG_URL` or <http://127.0.0.1:3000/api>
    #[arg(short = 'u', long, env = "AGRO_CATALOG_URL")]
    pub url: Option<String>,

    /// Bearer token for media uploads
    #[arg(long, env = "AGRO_CATALOG_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File for the persisted selection (default: agro/state.json in the user config directory)
    #[arg(long, value_name = "FILE", env = "AGRO_STATE_FILE")]
    pub state: Option<PathBuf>,

    /// Write output to file (default: stdout)
    #[arg(short = 'o', long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// JSON output (default)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Table output format
    #[arg(short, long, global = true)]
    pub table: bool,

    /// Quiet mode - suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (repeat for more: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the catalog, starting from the last selection
    Search(SearchArgs),

    /// Show facet vocabularies
    Options {
        /// Facet category (default: all)
        category: Option<CategoryArg>,
    },

    /// Show one listing
    Show {
        /// Listing id
        id: String,
    },

    /// Upload media files, one at a time
    Upload(UploadArgs),

    /// Show or clear the persisted selection
    #[command(alias = "preferences")]
    Prefs(PrefsArgs),
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Property type (finca, lote, casa-campestre, ...)
    #[arg(long = "type", value_name = "TYPE")]
    pub property_type: Option<String>,

    /// Start from empty filters instead of the persisted ones
    #[arg(long)]
    pub reset: bool,

    #[arg(long)]
    pub municipality: Option<String>,

    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub price_min: Option<String>,

    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub price_max: Option<String>,

    /// Minimum area (hectares)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub area_min: Option<String>,

    /// Maximum area (hectares)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub area_max: Option<String>,

    /// Soil types, comma separated
    #[arg(long, value_delimiter = ',')]
    pub soil: Vec<String>,

    /// Water sources, comma separated
    #[arg(long, value_delimiter = ',')]
    pub water: Vec<String>,

    /// Pasture types, comma separated
    #[arg(long, value_delimiter = ',')]
    pub pasture: Vec<String>,

    /// Crops, comma separated
    #[arg(long, value_delimiter = ',')]
    pub crop: Vec<String>,

    /// Topography types, comma separated
    #[arg(long, value_delimiter = ',')]
    pub topography: Vec<String>,

    /// Use types, comma separated
    #[arg(long = "use", value_delimiter = ',')]
    pub use_types: Vec<String>,

    /// Only listings with electricity (`--electricity=false` clears it)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub electricity: Option<bool>,

    /// Free text search
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    /// Page to show
    #[arg(long, value_name = "N")]
    pub page: Option<u32>,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Media kind
    #[arg(long, value_enum, default_value = "image")]
    pub kind: MediaKindArg,

    /// Files to upload, in order
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommands,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Print the persisted property type, filters and sort
    Show,
    /// Forget the persisted selection
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Newest first
    #[value(name = "recientes")]
    Recent,
    #[value(name = "precio-asc")]
    PriceAsc,
    #[value(name = "precio-desc")]
    PriceDesc,
    #[value(name = "area-asc")]
    AreaAsc,
}

impl SortArg {
    pub fn to_sort(self) -> SortOrder {
        match self {
            Self::Recent => SortOrder::Recent,
            Self::PriceAsc => SortOrder::PriceAsc,
            Self::PriceDesc => SortOrder::PriceDesc,
            Self::AreaAsc => SortOrder::AreaAsc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MediaKindArg {
    Image,
    Video,
    /// 360 degree panorama
    Image360,
}

impl MediaKindArg {
    pub fn to_kind(self) -> MediaKind {
        match self {
            Self::Image => MediaKind::Image,
            Self::Video => MediaKind::Video,
            Self::Image360 => MediaKind::Image360,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    #[value(name = "pastureTypes", alias = "pasture")]
    PastureTypes,
    #[value(name = "waterSources", alias = "water")]
    WaterSources,
    #[value(name = "topographyTypes", alias = "topography")]
    TopographyTypes,
    #[value(name = "soilTypes", alias = "soil")]
    SoilTypes,
    #[value(name = "useTypes", alias = "use")]
    UseTypes,
}

impl CategoryArg {
    pub fn to_category(self) -> FacetCategory {
        match self {
            Self::PastureTypes => FacetCategory::PastureTypes,
            Self::WaterSources => FacetCategory::WaterSources,
            Self::TopographyTypes => FacetCategory::TopographyTypes,
            Self::SoilTypes => FacetCategory::SoilTypes,
            Self::UseTypes => FacetCategory::UseTypes,
        }
    }
}

pub struct AppContext {
    pub client: CatalogClient,
    pub storage: Arc<dyn Storage>,
    pub output: Output,
}

impl AppContext {
    /// Controller over the shared client and storage.
    pub fn controller(&self) -> CatalogController<&CatalogClient, Arc<dyn Storage>> {
        let settings = ControllerSettings::default().page_size(self.client.get_config().page_size);
        CatalogController::new(&self.client, self.storage.clone(), settings)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(resolve_output_format(&cli), cli.output.clone());
    let client = build_client(&cli)?;
    let storage = build_storage(cli.state.clone());

    let ctx = AppContext {
        client,
        storage,
        output,
    };

    let result = match cli.command {
        Commands::Search(args) => search::handle(&ctx, args).await,
        Commands::Options { category } => options::handle(&ctx, category).await,
        Commands::Show { id } => show::handle(&ctx, &id).await,
        Commands::Upload(args) => upload::handle(&ctx, args).await,
        Commands::Prefs(args) => prefs::handle(&ctx, args.command),
    };
    debug!(metrics = %ctx.client.http_metrics(), "http");
    result
}

fn resolve_output_format(cli: &Cli) -> OutputFormat {
    if cli.quiet {
        OutputFormat::Quiet
    } else if cli.pretty {
        if cli.table {
            warn!("--pretty conflicts with --table. Using json pretty format");
        }
        OutputFormat::Pretty
    } else if cli.json {
        if cli.table {
            warn!("--json conflicts with --table. Using json format");
        }
        OutputFormat::Json
    } else if cli.table {
        OutputFormat::Table
    } else {
        OutputFormat::Json
    }
}

fn build_client(cli: &Cli) -> Result<CatalogClient> {
    let mut config = ClientConfig::default();
    if let Some(url) = &cli.url {
        config = config.base_url(url);
    }
    let client = CatalogClient::with_config(config)?;
    if let Some(token) = cli.token.as_deref().filter(|t| !t.is_empty()) {
        client.set_token(BearerToken::new(token));
    }
    Ok(client)
}

/// Explicit path, else the file in the home directory, else memory only.
fn build_storage(path: Option<PathBuf>) -> Arc<dyn Storage> {
    let path = path.unwrap_or_else(|| default_state_path(dirs::config_dir()));
    debug!(?path, "state file");
    Arc::new(FileStorage::new(path))
}

/// `agro/state.json` under the config dir, or the working directory when there is none.
fn default_state_path(config_dir: Option<PathBuf>) -> PathBuf {
    config_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agro")
        .join("state.json")
}
