//! Merge harness: merges JSON hit files page by page and prints each chunk.
//!
//! Every positional argument is a JSON file holding one array of hits,
//! already sorted by the configured key. Chunks are written to stdout as one
//! JSON array per line; tracing goes to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use paged_merge::{BoxedSource, MemorySource, MergeConfig, MergeEngine, SortDirection};
use serde_json::Value;

/// Merge pre-sorted JSON hit files through the paged merge engine.
#[derive(Parser)]
#[command(name = "merge-harness", version, about)]
struct Cli {
    /// Path to TOML merge configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Field path to sort by (overrides the config file).
    #[arg(long)]
    sort_key: Option<String>,

    /// Sort direction: asc or desc (overrides the config file).
    #[arg(long)]
    direction: Option<SortDirection>,

    /// Hits served per source page.
    #[arg(long, default_value_t = 3)]
    page_size: usize,

    /// Print the final cursor token to stderr.
    #[arg(long)]
    token: bool,

    /// JSON files, one sorted array of hits per source.
    #[arg(required = true)]
    sources: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("paged_merge=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MergeConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MergeConfig::default(),
    };
    if let Some(key) = cli.sort_key {
        config.sort_key = Some(key);
    }
    if let Some(direction) = cli.direction {
        config.sort_direction = direction;
    }

    let sources = cli
        .sources
        .iter()
        .map(|path| load_source(path, cli.page_size, config.first_page))
        .collect::<anyhow::Result<Vec<_>>>()?;

    tracing::info!(
        sources = sources.len(),
        page_size = cli.page_size,
        "merge-harness starting"
    );

    let mut engine = MergeEngine::from_config(sources, &config)?;
    let mut chunk_count = 0usize;
    {
        let mut chunks = std::pin::pin!(engine.chunks(&()));
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            chunk_count += 1;
            println!("{}", serde_json::to_string(&chunk)?);
        }
    }

    tracing::info!(
        chunks = chunk_count,
        cached_pages = engine.cached_pages(),
        "merge complete"
    );
    if cli.token {
        eprintln!("{}", engine.extract_token()?);
    }
    Ok(())
}

fn load_source(path: &Path, page_size: usize, first_page: u32) -> anyhow::Result<BoxedSource<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let hits: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of hits", path.display()))?;
    Ok(Box::new(
        MemorySource::new(hits, page_size).with_first_page(first_page),
    ))
}
