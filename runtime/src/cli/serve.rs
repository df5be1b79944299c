//! Run the HTTP service.

use crate::audit::AuditLogger;
use crate::cli::output::{self, Styled};
use crate::config::RuntimeConfig;
use crate::renderer::chromium::{ChromiumOptions, ChromiumRenderer};
use crate::scrape::{ScrapeOptions, Scraper};
use crate::server::{self, AppState};
use crate::store::SqliteStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Build the scraper described by `config`. Chromium starts on first use.
pub fn build_scraper(config: &RuntimeConfig) -> Result<Scraper> {
    let renderer = Arc::new(ChromiumRenderer::new(ChromiumOptions {
        executable: config.chromium_path.clone(),
        settle_ms: config.settle_ms,
        ..ChromiumOptions::default()
    }));
    let mut scraper = Scraper::new(
        renderer,
        config.max_concurrent_scrapes,
        ScrapeOptions {
            nav_timeout_ms: config.nav_timeout_ms,
        },
    )?;
    if let Some(path) = &config.audit_log {
        scraper = scraper.with_audit(AuditLogger::open(path)?);
    }
    Ok(scraper)
}

/// Serve the API until Ctrl-C.
pub async fn run(config: RuntimeConfig) -> Result<()> {
    let s = Styled::new();
    info!("starting PageSure v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let scraper = Arc::new(build_scraper(&config)?);
    let state = AppState {
        scraper: Arc::clone(&scraper),
        pages: store.clone(),
        reviews: store,
    };

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    if !output::is_quiet() {
        eprintln!(
            "  {} PageSure v{} listening on {}",
            s.ok_sym(),
            env!("CARGO_PKG_VERSION"),
            s.cyan(&format!("http://{addr}"))
        );
    }

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
    };
    let result = server::serve(listener, state, &config.cors_origins, shutdown).await;

    if let Err(e) = scraper.shutdown().await {
        warn!("browser shutdown failed: {e}");
    }
    if !output::is_quiet() {
        eprintln!("  {} PageSure stopped.", s.ok_sym());
    }
    result
}
