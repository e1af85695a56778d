//! Crawl one site from the command line and print the ranked logos as JSON.
//!
//! Usage: `logo_probe <url> [max_pages]`

use anyhow::{bail, Context};
use logo_scout::{CrawlerConfig, LogoCrawler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("logo_scout=info,warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        bail!("usage: logo_probe <url> [max_pages]");
    };
    let config = CrawlerConfig::from_env()?.validated()?;
    let max_pages = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid max_pages {n:?}"))?,
        None => config.max_pages,
    };

    let crawler = LogoCrawler::from_config(config)?;
    let report = crawler.crawl_with(&url, max_pages).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
