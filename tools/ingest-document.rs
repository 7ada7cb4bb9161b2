//! Ingest the import maps declared in an HTML page and print the merged map
//!
//! External import maps are read from disk relative to the page, so the page
//! and its maps must be local files.
//!
//! Usage:
//!   ingest-document <page.html> [--base-url <url>] [--config <file>] [--compact]

#[cfg(not(target_os = "windows"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use importmap_ingest::config::BootstrapConfig;
use importmap_ingest::utils::init_logging_from_config;
use importmap_ingest::{BootstrapBuilder, FileFetcher, MemoryDocument};

#[derive(Parser, Debug)]
#[command(about = "Merge the import maps declared in an HTML page")]
struct Args {
    /// HTML page to scan
    page: PathBuf,

    /// Base URL (defaults to the page's directory)
    #[arg(long)]
    base_url: Option<String>,

    /// Configuration file (JSON or TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the merged map on one line
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BootstrapConfig::from_file(path)?,
        None => BootstrapConfig::default(),
    };
    init_logging_from_config(config.logging.as_ref());

    let page = std::fs::canonicalize(&args.page)?;
    config.base_url = match args.base_url {
        Some(base_url) => base_url,
        None => page
            .parent()
            .map(|dir| dir.to_string_lossy().to_string())
            .unwrap_or_else(|| "/".to_string()),
    };

    let html = std::fs::read_to_string(&page)?;
    let document = Arc::new(MemoryDocument::from_html(
        &html,
        config.declaration_types.clone(),
    ));
    info!("Loaded {} declarations from {:?}", document.len(), page);

    let bootstrap = BootstrapBuilder::from_config(&config)?
        .with_document(document)
        .with_fetcher(Arc::new(FileFetcher))
        .build();
    bootstrap.document_ready();

    if let Err(e) = bootstrap.prepare_import(false).await {
        warn!("Import map ingestion stopped early: {}", e);
        eprintln!("error: {}", e);
    }

    let map = bootstrap.import_map();
    let json = if args.compact {
        serde_json::to_string(&map)?
    } else {
        serde_json::to_string_pretty(&map)?
    };
    println!("{}", json);

    if bootstrap.queue().is_poisoned() {
        std::process::exit(1);
    }
    Ok(())
}
