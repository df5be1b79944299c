//! Browser rendering abstraction.
//!
//! The scraper only needs to open a page, load a URL, and evaluate a script
//! in it. These traits keep the headless-browser engine behind a seam so
//! the pool, scraper, and server can run against a fake in tests.

pub mod chromium;
#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use async_trait::async_trait;

/// Outcome of loading a URL in a render context.
#[derive(Debug, Clone, Default)]
pub struct NavigationResult {
    /// URL after redirects.
    pub final_url: String,
    /// Time from navigation start until the page settled.
    pub load_time_ms: u64,
}

/// A browser engine able to open isolated rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh context (a browser tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;

    /// Shut the engine down. Open contexts become unusable.
    async fn shutdown(&self) -> Result<()>;

    /// Number of contexts currently open.
    fn active_contexts(&self) -> usize;
}

/// A single rendering context.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Load `url`, failing if it does not settle within `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Evaluate a script in the page and return its JSON value.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;

    /// Close the context and free its resources.
    async fn close(&mut self) -> Result<()>;
}
