//! Scrape a single page and print its record.

use crate::cli::output;
use crate::cli::serve::build_scraper;
use crate::config::RuntimeConfig;
use crate::scrape::parse_page_url;
use anyhow::Result;
use tracing::warn;

pub async fn run(config: &RuntimeConfig, url: &str) -> Result<()> {
    let target = parse_page_url(url)?;
    let scraper = build_scraper(config)?;

    let result = scraper.scrape(&target).await;
    if let Err(e) = scraper.shutdown().await {
        warn!("browser shutdown failed: {e}");
    }

    output::print_json(&result?);
    Ok(())
}
