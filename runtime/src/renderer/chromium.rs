//! Headless Chromium renderer built on `chromiumoxide`.

use super::{NavigationResult, RenderContext, Renderer};
use crate::config::pagesure_home;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Desktop Chrome user agent; Facebook serves a reduced page to headless UAs.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Launch options for [`ChromiumRenderer`].
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub executable: Option<PathBuf>,
    /// Delay after navigation before the page is considered settled.
    pub settle_ms: u64,
    pub user_agent: String,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            executable: None,
            settle_ms: 2_000,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// A launched browser and the task draining its CDP events.
struct Running {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Renderer backed by one shared headless Chromium process.
///
/// The browser starts on first use, so the service comes up without
/// Chromium and scrapes fail with the launch error instead.
pub struct ChromiumRenderer {
    running: Mutex<Option<Running>>,
    options: ChromiumOptions,
    active: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Renderer that launches Chromium on the first context request.
    pub fn new(options: ChromiumOptions) -> Self {
        Self {
            running: Mutex::new(None),
            options,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Launch Chromium headless right away.
    pub async fn launch(options: ChromiumOptions) -> Result<Self> {
        let renderer = Self::new(options);
        *renderer.running.lock().await = Some(start_browser(&renderer.options).await?);
        Ok(renderer)
    }
}

async fn start_browser(options: &ChromiumOptions) -> Result<Running> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .window_size(1280, 900);

    let executable = options.executable.clone().or_else(find_chromium);
    if let Some(path) = &executable {
        builder = builder.chrome_executable(path);
    }

    let config = builder
        .build()
        .map_err(|e| anyhow!("invalid browser config: {e}"))?;
    let (browser, mut events) = Browser::launch(config)
        .await
        .context("failed to launch Chromium")?;

    let handler = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if let Err(e) = event {
                debug!("browser event error: {e}");
            }
        }
    });

    info!(
        executable = executable
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "auto".to_string()),
        "launched headless Chromium"
    );
    Ok(Running { browser, handler })
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = {
            let mut running = self.running.lock().await;
            if running.is_none() {
                *running = Some(start_browser(&self.options).await?);
            }
            let Some(Running { browser, .. }) = running.as_ref() else {
                bail!("Chromium is not running");
            };
            browser
                .new_page("about:blank")
                .await
                .context("failed to open browser tab")?
        };
        page.set_user_agent(self.options.user_agent.as_str())
            .await
            .context("failed to set user agent")?;

        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ChromiumContext {
            page: Some(page),
            settle: Duration::from_millis(self.options.settle_ms),
            active: Arc::clone(&self.active),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        let Some(Running {
            mut browser,
            handler,
        }) = self.running.lock().await.take()
        else {
            return Ok(());
        };
        if let Err(e) = browser.close().await {
            warn!("browser close failed: {e}");
        }
        browser.wait().await.context("waiting for Chromium to exit")?;
        handler.abort();
        info!("Chromium stopped");
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// One Chromium tab.
struct ChromiumContext {
    page: Option<Page>,
    settle: Duration,
    active: Arc<AtomicUsize>,
}

impl ChromiumContext {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or_else(|| anyhow!("browser tab already closed"))
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let page = self.page()?;
        let start = Instant::now();

        let load = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        tokio::time::timeout(Duration::from_millis(timeout_ms), load)
            .await
            .map_err(|_| anyhow!("Navigation timeout of {timeout_ms} ms exceeded"))?
            .with_context(|| format!("failed to load {url}"))?;

        tokio::time::sleep(self.settle).await;

        let final_url = page.url().await?.unwrap_or_else(|| url.to_string());
        Ok(NavigationResult {
            final_url,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .context("script evaluation failed")?;
        result
            .into_value::<serde_json::Value>()
            .context("script returned a non-JSON value")
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            self.active.fetch_sub(1, Ordering::SeqCst);
            page.close().await.context("failed to close browser tab")?;
        }
        Ok(())
    }
}

/// Find a Chromium binary: `$PAGESURE_CHROMIUM_PATH`, then
/// `~/.pagesure/chromium`, then `PATH`.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("PAGESURE_CHROMIUM_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    let home = pagesure_home().join("chromium");
    let bundled = if cfg!(target_os = "macos") {
        vec![
            home.join("Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            home.join("chrome"),
        ]
    } else {
        vec![home.join("chrome"), home.join("chrome-linux64/chrome")]
    };
    if let Some(path) = bundled.into_iter().find(|p| p.exists()) {
        return Some(path);
    }

    ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Version string reported by a Chromium binary.
pub fn chromium_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Some(raw.replace("Google Chrome ", "").replace("Chromium ", ""))
}
