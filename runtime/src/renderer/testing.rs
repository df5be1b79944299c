//! In-memory renderer for unit tests.

use super::{NavigationResult, RenderContext, Renderer};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use pagesure::PageSnapshot;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone)]
enum FakePage {
    Snapshot(serde_json::Value),
    NavError(String),
}

/// Serves canned snapshots keyed by URL.
#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, FakePage>,
    launch_error: Option<String>,
    active: Arc<AtomicUsize>,
    opened: AtomicUsize,
}

impl FakeRenderer {
    pub fn failing_launch(msg: &str) -> Self {
        Self {
            launch_error: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, url: &str, snapshot: PageSnapshot) -> Self {
        let value = serde_json::to_value(snapshot).unwrap_or_default();
        self.pages.insert(url.to_string(), FakePage::Snapshot(value));
        self
    }

    pub fn with_nav_error(mut self, url: &str, msg: &str) -> Self {
        self.pages
            .insert(url.to_string(), FakePage::NavError(msg.to_string()));
        self
    }

    /// Contexts opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        if let Some(msg) = &self.launch_error {
            bail!("{msg}");
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeContext {
            pages: self.pages.clone(),
            current: None,
            open: true,
            active: Arc::clone(&self.active),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

struct FakeContext {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    open: bool,
    active: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        if let Some(FakePage::NavError(msg)) = self.pages.get(url) {
            bail!("{msg}");
        }
        self.current = Some(url.to_string());
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }

    async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
        let url = self.current.as_deref().ok_or_else(|| anyhow!("no page loaded"))?;
        match self.pages.get(url) {
            Some(FakePage::Snapshot(value)) => Ok(value.clone()),
            _ => Ok(serde_json::json!({ "html": "<html><body></body></html>" })),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
