//! Headless-browser fallback rendering.
//!
//! When plain HTTP comes back blocked, the session escalates to a real
//! Chromium instance: launch once per session, open a fresh page per
//! render, capture the DOM after client-side scripts have had time to run.
//! The [`Browser`] and [`BrowserPage`] traits keep the engine swappable so
//! the state machine can be tested without a browser install.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config;
use crate::error::{Error, Result};
use crate::fetch::{FetchResult, Provenance};

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. GLEANER_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("GLEANER_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// A browser engine that can open pages.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a fresh page (tab).
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>>;
    /// Shut down the engine.
    async fn shutdown(&self) -> Result<()>;
}

/// A single open page.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate to a URL. `Ok(false)` means the load did not finish within
    /// the timeout; the page may still hold partial content worth capturing.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<bool>;
    /// Serialize the current DOM.
    async fn content(&self) -> Result<String>;
    /// Close this page.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Chromium engine via chromiumoxide.
pub struct ChromiumBrowser {
    browser: chromiumoxide::browser::Browser,
}

impl ChromiumBrowser {
    /// Launch a headless Chromium instance.
    pub async fn launch() -> Result<Self> {
        let chrome_path = find_chromium().ok_or_else(|| {
            Error::Browser(
                "Chromium not found. Install Chrome/Chromium or set GLEANER_CHROMIUM_PATH".into(),
            )
        })?;
        debug!(path = %chrome_path.display(), "launching Chromium");

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg(format!("--user-agent={}", config::USER_AGENT))
            .arg("--lang=en-US,en")
            .build()
            .map_err(|e| Error::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = chromiumoxide::browser::Browser::launch(config)
            .await
            .map_err(|e| Error::Browser(format!("failed to launch Chromium: {e}")))?;

        // Drain CDP events for the life of the browser.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Browser(format!("failed to open page: {e}")))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        // The child process is killed when the Browser handle drops.
        Ok(())
    }
}

/// One Chromium tab.
pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<bool> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                // Best effort: some pages never fire a clean load event.
                let _ = self.page.wait_for_navigation().await;
                Ok(true)
            }
            Ok(Err(e)) => Err(Error::Browser(format!("navigation to {url} failed: {e}"))),
            Err(_) => Ok(false),
        }
    }

    async fn content(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .map_err(|e| Error::Browser(format!("failed to read page HTML: {e}")))?;
        result
            .into_value()
            .map_err(|e| Error::Browser(format!("failed to decode page HTML: {e}")))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}

/// Lazily-launched rendering fallback. One engine per session, one fresh
/// page per render.
pub struct BrowserFetcher {
    engine: Option<Arc<dyn Browser>>,
    nav_timeout: Duration,
}

impl BrowserFetcher {
    pub fn new(nav_timeout: Duration) -> Self {
        Self {
            engine: None,
            nav_timeout,
        }
    }

    /// Use a prelaunched engine instead of discovering Chromium at first
    /// render. This is the seam for tests and embedders.
    pub fn with_engine(engine: Arc<dyn Browser>, nav_timeout: Duration) -> Self {
        Self {
            engine: Some(engine),
            nav_timeout,
        }
    }

    async fn engine(&mut self) -> Result<Arc<dyn Browser>> {
        if let Some(engine) = &self.engine {
            return Ok(Arc::clone(engine));
        }
        info!("starting headless browser");
        let engine: Arc<dyn Browser> = Arc::new(ChromiumBrowser::launch().await?);
        self.engine = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Render a page and capture its DOM. A navigation timeout is soft:
    /// whatever the page holds after `settle` is returned anyway.
    pub async fn render(&mut self, url: &str, settle: Duration) -> Result<FetchResult> {
        let engine = self.engine().await?;
        let mut page = engine.new_page().await?;

        let settled = match page.goto(url, self.nav_timeout).await {
            Ok(settled) => settled,
            Err(e) => {
                let _ = page.close().await;
                return Err(e);
            }
        };
        if !settled {
            warn!(url, "navigation timed out; capturing whatever loaded");
        }

        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        let content = page.content().await;
        let _ = page.close().await;
        let body = content?;

        debug!(url, bytes = body.len(), "rendered");
        Ok(FetchResult {
            // Rendered results record the navigation target, not whatever
            // URL the page ended up on.
            final_url: url.to_string(),
            status: 200,
            body,
            provenance: Provenance::Rendered,
        })
    }

    /// Shut down the engine if one was launched.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(engine) = self.engine.take() {
            engine.shutdown().await?;
        }
        Ok(())
    }
}
