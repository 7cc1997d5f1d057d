// searchpool CLI
//
// Runs one search through a Chromium-backed pool and prints the response
// envelope as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use searchpool::{
    ApiResponse, ChromiumRenderer, ChromiumRendererConfig, SearchQuery, SearchService, Settings,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Query a search provider through a pool of headless browsers
#[derive(Debug, Parser)]
#[command(name = "searchpool", version, about)]
struct Cli {
    /// Provider name, matching `<schema-dir>/<provider>.json`
    #[arg(short, long)]
    provider: String,

    /// Search keyword
    #[arg(short, long)]
    keyword: String,

    /// Result page to start from
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Number of results to collect
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// Directory holding provider files (overrides SEARCHPOOL_SCHEMA_DIR)
    #[arg(long)]
    schema_dir: Option<PathBuf>,

    /// Region code for provider base URLs (overrides SEARCHPOOL_REGION)
    #[arg(long)]
    region: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!("searchpool={level}")),
    }
    .add_directive("chromiumoxide::handler=off".parse()?)
    .add_directive("chromiumoxide::conn=off".parse()?);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env().context("Invalid SEARCHPOOL_* environment")?;
    if let Some(dir) = cli.schema_dir {
        settings.schema_dir = dir;
    }
    if let Some(region) = cli.region {
        settings.region = region.to_lowercase();
    }
    if cli.headed {
        settings.headless = false;
    }
    init_logging(&settings.log_level)?;

    let renderer = ChromiumRenderer::new(ChromiumRendererConfig::from_settings(&settings));
    let service = SearchService::new(settings, renderer).context("Invalid pool configuration")?;
    service
        .initialize()
        .await
        .context("Failed to start browser pool")?;

    let query = SearchQuery::new(cli.provider, cli.keyword)
        .page(cli.page)
        .count(cli.count);

    let search = service.search_response(&query);
    tokio::pin!(search);
    let response = tokio::select! {
        response = &mut search => response,
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("Interrupted, shutting down");
                ApiResponse::failure(499, "Search interrupted", None)
            }
            Err(e) => {
                warn!("Failed to listen for Ctrl-C: {}", e);
                search.await
            }
        }
    };

    service.close().await;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{output}");

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
