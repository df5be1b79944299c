//! Test harness: the API on an ephemeral port, backed by a temp database and
//! a renderer serving canned snapshots.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use pagesure::PageSnapshot;
use pagesure_runtime::renderer::{NavigationResult, RenderContext, Renderer};
use pagesure_runtime::scrape::{ScrapeOptions, Scraper};
use pagesure_runtime::server::{self, AppState};
use pagesure_runtime::store::SqliteStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Clone)]
enum Canned {
    Page(serde_json::Value),
    Fail(String),
}

/// Renderer answering from a URL-keyed table.
#[derive(Default)]
pub struct StubRenderer {
    pages: HashMap<String, Canned>,
    opened: AtomicUsize,
}

impl StubRenderer {
    pub fn page(mut self, url: &str, html: &str) -> Self {
        let value = serde_json::to_value(PageSnapshot::from_html(html)).unwrap();
        self.pages.insert(url.to_string(), Canned::Page(value));
        self
    }

    pub fn failing(mut self, url: &str, message: &str) -> Self {
        self.pages
            .insert(url.to_string(), Canned::Fail(message.to_string()));
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubContext {
            pages: self.pages.clone(),
            current: None,
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        0
    }
}

struct StubContext {
    pages: HashMap<String, Canned>,
    current: Option<Canned>,
}

#[async_trait]
impl RenderContext for StubContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        match self.pages.get(url) {
            Some(Canned::Fail(message)) => bail!("{message}"),
            Some(page) => self.current = Some(page.clone()),
            None => bail!("Navigation timeout of {timeout_ms} ms exceeded"),
        }
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 5,
        })
    }

    async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
        match &self.current {
            Some(Canned::Page(value)) => Ok(value.clone()),
            _ => bail!("no page loaded"),
        }
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct TestServer {
    pub base: String,
    pub renderer: Arc<StubRenderer>,
    pub client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    pub async fn start(renderer: StubRenderer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(&dir.path().join("pagesure.db")).unwrap());
        let renderer = Arc::new(renderer);
        let scraper = Scraper::new(renderer.clone(), 2, ScrapeOptions::default()).unwrap();
        let state = AppState {
            scraper: Arc::new(scraper),
            pages: store.clone(),
            reviews: store,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let origins = vec![ALLOWED_ORIGIN.to_string()];
        tokio::spawn(async move {
            server::serve(listener, state, &origins, std::future::pending()).await
        });

        Self {
            base,
            renderer,
            client: reqwest::Client::new(),
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// POST JSON and return status plus parsed body (`null` when empty).
    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> (u16, serde_json::Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        let text = response.text().await.unwrap();
        let value = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, path: &str) -> (u16, serde_json::Value) {
        self.send(reqwest::Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }
}

pub const LILA_URL: &str = "https://www.facebook.com/maisonlila";

pub const LILA_HTML: &str = r#"<html><body>
  <svg><g><image xlink:href="https://scontent.example/lila.jpg"></image></g></svg>
  <div><h1>Maison Lila<svg title="Compte vérifié"></svg></h1></div>
  <div><span><strong>Page</strong> · Magasin de vêtements</span></div>
</body></html>"#;
