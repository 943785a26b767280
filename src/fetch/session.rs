//! The fetch session: one logical scraping conversation with a site.
//!
//! A [`Session`] owns the retry/fallback state machine. Plain HTTP runs
//! first; a blocked response escalates to browser rendering, a transient
//! failure retries within budget, and in strict mode unacceptable statuses
//! become errors instead of absences. The last good page stays available
//! for extraction until the next successful fetch replaces it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::document::{element_text, Document};
use crate::extract::table::{extract_table, TableMatrix};
use crate::fetch::browser::{Browser, BrowserFetcher};
use crate::fetch::http::{HttpFetcher, Outcome};
use crate::fetch::transport::{Method, ReqwestTransport, Transport};
use crate::fetch::FetchResult;
use crate::limiter::RateLimiter;

const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Per-call fetch knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Extra attempts after a transient failure.
    pub retries: u32,
    /// Skip plain HTTP entirely and render in the browser.
    pub force_browser: bool,
}

/// A stateful scraping session. See the module docs for the fetch contract;
/// extraction helpers read the most recently stored page.
pub struct Session {
    config: Config,
    limiter: Arc<RateLimiter>,
    transport: Arc<dyn Transport>,
    http: HttpFetcher,
    browser: BrowserFetcher,
    current: Option<FetchResult>,
}

impl Session {
    /// Session with its own HTTP client built from the configuration.
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Session over a caller-provided transport, with its own rate limiter.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.effective_delay()));
        Self::with_shared(config, limiter, transport)
    }

    /// Session sharing a rate limiter and transport with others. Pool
    /// workers use this so one request budget spans all of them.
    pub fn with_shared(
        config: Config,
        limiter: Arc<RateLimiter>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let http = HttpFetcher::new(Arc::clone(&transport), config.strict);
        let browser = BrowserFetcher::new(config.nav_timeout);
        Self {
            config,
            limiter,
            transport,
            http,
            browser,
            current: None,
        }
    }

    /// Replace the lazily-launched browser with a prelaunched engine.
    pub fn set_browser_engine(&mut self, engine: Arc<dyn Browser>) {
        self.browser = BrowserFetcher::with_engine(engine, self.config.nav_timeout);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The most recently stored page, if any fetch has succeeded.
    pub fn current(&self) -> Option<&FetchResult> {
        self.current.as_ref()
    }

    /// Parse the current page for querying.
    pub fn document(&self) -> Option<Document> {
        self.current.as_ref().map(FetchResult::document)
    }

    pub(crate) fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Fetch with default options. `None` falls back to the configured
    /// base URL.
    pub async fn fetch(&mut self, url: Option<&str>) -> Result<Option<&FetchResult>> {
        self.fetch_with(url, FetchOptions::default()).await
    }

    /// Fetch a page through the full state machine.
    ///
    /// Returns `Ok(Some(_))` with the stored result, or `Ok(None)` when the
    /// page could not be obtained and strict mode is off. Failures never
    /// touch the previously stored page.
    pub async fn fetch_with(
        &mut self,
        url: Option<&str>,
        opts: FetchOptions,
    ) -> Result<Option<&FetchResult>> {
        let target = match url.or(self.config.base_url.as_deref()) {
            Some(t) => t.to_string(),
            None => return Err(Error::NoUrl),
        };

        if opts.force_browser {
            return self.render(&target, self.config.settle_wait).await;
        }

        let mut attempt = 0u32;
        loop {
            self.limiter.wait().await;
            debug!(url = %target, attempt, "fetching");

            match self.http.get(&target).await {
                Outcome::Success(result) => {
                    debug!(url = %result.final_url, status = result.status, "fetched");
                    self.current = Some(result);
                    return Ok(self.current.as_ref());
                }
                Outcome::Blocked { status, marker } => {
                    warn!(url = %target, status, marker, "blocked; switching to browser mode");
                    return self.render(&target, self.config.settle_wait).await;
                }
                Outcome::Transient(e) => {
                    error!(url = %target, error = %e, "request failed");
                    if attempt < opts.retries {
                        attempt += 1;
                        tokio::time::sleep(RETRY_BACKOFF).await;
                        continue;
                    }
                    if self.config.strict {
                        return Err(Error::Transport {
                            url: target,
                            source: e,
                        });
                    }
                    return Ok(None);
                }
                Outcome::Fatal { status, url } => {
                    if self.config.strict {
                        return Err(Error::Status { status, url });
                    }
                    warn!(url = %target, status, "unacceptable status");
                    return Ok(None);
                }
            }
        }
    }

    /// Re-fetch the current page with browser rendering, replacing the
    /// stored result. Warns and returns `Ok(None)` when nothing has been
    /// fetched yet.
    pub async fn render_js(&mut self, settle: Duration) -> Result<Option<&FetchResult>> {
        let Some(current) = &self.current else {
            warn!("no current page to render");
            return Ok(None);
        };
        let target = current.final_url.clone();
        self.render(&target, settle).await
    }

    async fn render(&mut self, target: &str, settle: Duration) -> Result<Option<&FetchResult>> {
        self.limiter.wait().await;
        debug!(url = %target, "rendering in browser");
        match self.browser.render(target, settle).await {
            Ok(result) => {
                self.current = Some(result);
                Ok(self.current.as_ref())
            }
            Err(e) => {
                if self.config.strict {
                    return Err(e);
                }
                error!(url = %target, error = %e, "browser rendering failed");
                Ok(None)
            }
        }
    }

    /// Rate-limited GET returning parsed JSON. HTTP and parse failures are
    /// errors regardless of strict mode, and the limiter is stamped again
    /// once the response is in, so the next delay counts from completion.
    pub async fn fetch_json(&mut self, url: Option<&str>) -> Result<serde_json::Value> {
        let target = match url.or(self.config.base_url.as_deref()) {
            Some(t) => t.to_string(),
            None => return Err(Error::NoUrl),
        };

        self.limiter.wait().await;
        debug!(url = %target, "fetching JSON");
        let outcome = self.transport.request(Method::Get, &target, None).await;
        self.limiter.record_now().await;

        let resp = outcome.map_err(|e| {
            error!(url = %target, error = %e, "JSON fetch failed");
            Error::Transport {
                url: target.clone(),
                source: e,
            }
        })?;
        if !(200..300).contains(&resp.status) {
            error!(url = %target, status = resp.status, "JSON fetch rejected");
            return Err(Error::Status {
                status: resp.status,
                url: target,
            });
        }
        serde_json::from_str(&resp.body).map_err(|e| {
            error!(url = %target, error = %e, "response is not valid JSON");
            Error::Json {
                url: target.clone(),
                source: e,
            }
        })
    }

    /// Submit a form via url-encoded POST. Success stores the response page
    /// like a fetch; failures follow the fetch contract (strict propagates,
    /// lax degrades to `Ok(None)`).
    pub async fn submit_form(
        &mut self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<Option<&FetchResult>> {
        if url.is_empty() || fields.is_empty() {
            return Err(Error::InvalidInput("url and form fields are required".into()));
        }

        self.limiter.wait().await;
        debug!(url, "submitting form");
        match self.http.post_form(url, fields).await {
            Outcome::Success(result) => {
                self.current = Some(result);
                Ok(self.current.as_ref())
            }
            Outcome::Fatal { status, url } => {
                if self.config.strict {
                    return Err(Error::Status { status, url });
                }
                error!(url = %url, status, "form submission rejected");
                Ok(None)
            }
            Outcome::Blocked { status, .. } => {
                if self.config.strict {
                    return Err(Error::Status {
                        status,
                        url: url.to_string(),
                    });
                }
                warn!(url, status, "form submission blocked");
                Ok(None)
            }
            Outcome::Transient(e) => {
                if self.config.strict {
                    return Err(Error::Transport {
                        url: url.to_string(),
                        source: e,
                    });
                }
                error!(url, error = %e, "form submission failed");
                Ok(None)
            }
        }
    }

    /// Text of the first element matching a selector; empty when no page
    /// has been fetched or nothing matches.
    pub fn get_text(&self, selector: &str) -> Result<String> {
        let Some(doc) = self.document() else {
            warn!("no page fetched yet");
            return Ok(String::new());
        };
        Ok(doc
            .select_one(selector)?
            .map(|el| element_text(&el))
            .unwrap_or_default())
    }

    /// Flattened text of every match on the current page.
    pub fn select_text(&self, selector: &str) -> Result<Vec<String>> {
        match self.document() {
            Some(doc) => doc.select_text(selector),
            None => Ok(Vec::new()),
        }
    }

    /// Unique links on the current page, resolved against its final URL.
    pub fn get_links(&self) -> Vec<String> {
        match self.document() {
            Some(doc) => doc.links(),
            None => {
                warn!("no page fetched yet");
                Vec::new()
            }
        }
    }

    /// Unique image sources on the current page, resolved against its
    /// final URL.
    pub fn get_images(&self) -> Vec<String> {
        match self.document() {
            Some(doc) => doc.images(),
            None => {
                warn!("no page fetched yet");
                Vec::new()
            }
        }
    }

    /// Reconstruct the biggest table matching `selector` on the current
    /// page. `Ok(None)` when no page is stored or nothing matches.
    pub fn get_table(&self, selector: Option<&str>) -> Result<Option<TableMatrix>> {
        let Some(doc) = self.document() else {
            warn!("no page fetched yet");
            return Ok(None);
        };
        extract_table(&doc, selector)
    }

    /// Shut the session down, closing the browser if one was launched.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await
    }
}
