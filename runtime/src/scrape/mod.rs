//! Page scraping: load a Facebook page in a render context, snapshot it, and
//! run the extraction heuristic over the snapshot.

use crate::audit::AuditLogger;
use crate::pool::ScrapePool;
use crate::renderer::{RenderContext, Renderer};
use anyhow::{Context, Result};
use pagesure::{is_facebook_host, page_id_from_url, Extractor, PageError, PageRecord, PageSnapshot};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

const SNAPSHOT_TEMPLATE: &str = include_str!("snapshot.js");

/// Script returning the NFC-normalized document plus the title and badge
/// boxes, with the badge selector shared with the extractor.
fn snapshot_script() -> String {
    let selector = serde_json::to_string(pagesure::extract::BADGE_SELECTOR)
        .unwrap_or_else(|_| "\"svg[title]\"".to_string());
    SNAPSHOT_TEMPLATE.replace("__BADGE_SELECTOR__", &selector)
}

/// Knobs for a single scrape.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub nav_timeout_ms: u64,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            nav_timeout_ms: 30_000,
        }
    }
}

/// A validated Facebook page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    /// The URL as submitted, trimmed.
    pub url: String,
    /// Absolute URL handed to the browser.
    pub navigate_url: String,
    pub page_id: String,
}

/// Validate a submitted page URL.
///
/// The host must be `facebook.com` or one of its subdomains; a missing
/// scheme is taken as `https`.
pub fn parse_page_url(raw: &str) -> Result<PageTarget, PageError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(PageError::MissingUrl);
    }
    let absolute = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    let parsed = url::Url::parse(&absolute).map_err(|_| PageError::NotFacebook)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PageError::NotFacebook);
    }
    if !is_facebook_host(parsed.host_str().unwrap_or("")) {
        return Err(PageError::NotFacebook);
    }
    let page_id = page_id_from_url(url)?;
    Ok(PageTarget {
        url: url.to_string(),
        navigate_url: parsed.to_string(),
        page_id,
    })
}

/// Run the snapshot script in an already loaded context.
pub async fn capture_snapshot(context: &dyn RenderContext) -> Result<PageSnapshot> {
    let value = context.execute_js(&snapshot_script()).await?;
    serde_json::from_value(value).context("snapshot script returned an unexpected shape")
}

/// Load `target` and extract its page record.
///
/// Parsing a rendered page takes a while, so extraction runs on the
/// blocking pool.
pub async fn scrape_page(
    context: &mut dyn RenderContext,
    extractor: &Arc<Extractor>,
    target: &PageTarget,
    options: &ScrapeOptions,
) -> Result<PageRecord> {
    let nav = context
        .navigate(&target.navigate_url, options.nav_timeout_ms)
        .await?;
    debug!(final_url = %nav.final_url, load_time_ms = nav.load_time_ms, "page loaded");
    let snapshot = capture_snapshot(context).await?;
    let extractor = Arc::clone(extractor);
    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&snapshot))
        .await
        .context("extraction task failed")?;
    Ok(PageRecord::from_extraction(extracted, &target.url))
}

/// Scrapes pages through a bounded pool of browser contexts.
pub struct Scraper {
    renderer: Arc<dyn Renderer>,
    pool: ScrapePool,
    extractor: Arc<Extractor>,
    options: ScrapeOptions,
    audit: Option<Mutex<AuditLogger>>,
}

impl Scraper {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        max_concurrent: usize,
        options: ScrapeOptions,
    ) -> Result<Self> {
        Ok(Self {
            pool: ScrapePool::new(Arc::clone(&renderer), max_concurrent),
            renderer,
            extractor: Arc::new(Extractor::new().context("failed to compile extractor")?),
            options,
            audit: None,
        })
    }

    /// Record every scrape in a JSONL audit log.
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(Mutex::new(logger));
        self
    }

    /// Scrape one page, waiting for a pool slot first.
    ///
    /// The context is closed whether or not the scrape succeeds.
    pub async fn scrape(&self, target: &PageTarget) -> Result<PageRecord> {
        let start = Instant::now();
        let result = self.scrape_pooled(target).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(record) => info!(
                url = %target.url,
                duration_ms,
                category = record.category_key.as_str(),
                "scrape ok"
            ),
            Err(e) => warn!(url = %target.url, duration_ms, error = %e, "scrape failed"),
        }
        self.audit(target, duration_ms, result.as_ref().err());
        result
    }

    async fn scrape_pooled(&self, target: &PageTarget) -> Result<PageRecord> {
        let mut handle = self.pool.acquire().await?;
        let result = match handle.context_mut() {
            Some(context) => scrape_page(context, &self.extractor, target, &self.options).await,
            None => Err(anyhow::anyhow!("browser context unavailable")),
        };
        if let Err(e) = self.pool.release(handle).await {
            warn!("failed to close browser context: {e}");
        }
        result
    }

    fn audit(&self, target: &PageTarget, duration_ms: u64, error: Option<&anyhow::Error>) {
        let Some(audit) = &self.audit else {
            return;
        };
        let error = error.map(|e| e.to_string());
        if let Ok(mut logger) = audit.lock() {
            if let Err(e) = logger.log_scrape(
                &target.url,
                Some(&target.page_id),
                duration_ms,
                error.as_deref(),
            ) {
                warn!("audit log write failed: {e}");
            }
        }
    }

    pub fn pool(&self) -> &ScrapePool {
        &self.pool
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.renderer.shutdown().await
    }
}
