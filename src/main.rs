use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use jauzzi::{Config, FeedClient, FeedSource};

/// Get the default config file path (~/.config/jauzzi/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("jauzzi")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "jauzzi", about = "Fetch an RSS feed and print its entries as JSON")]
struct Args {
    /// Feed URL
    url: String,

    /// Fetch the feed directly as RSS XML instead of through the JSON feed proxy
    #[arg(long)]
    xml: bool,

    /// Config file (defaults to ~/.config/jauzzi/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let client = FeedClient::new(config.feed_settings()).context("Failed to build HTTP client")?;
    let source = if args.xml {
        FeedSource::Xml
    } else {
        FeedSource::JsonApi
    };

    let entries = client
        .fetch(&args.url, source)
        .await
        .with_context(|| format!("Failed to fetch feed {}", args.url))?;
    tracing::info!(feed = %args.url, entries = entries.len(), "Fetched feed");

    let output = if args.pretty {
        serde_json::to_string_pretty(&entries)?
    } else {
        serde_json::to_string(&entries)?
    };
    println!("{output}");

    Ok(())
}
