//! Session configuration.
//!
//! A plain value struct: construct one, tweak the fields you care about, and
//! hand it to [`Session::new`](crate::Session::new). The defaults mirror a
//! desktop Chrome profile so plain HTTP fetches blend in with ordinary
//! browser traffic.

use std::time::Duration;

/// User agent presented by both the HTTP client and the headless browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/121.0.0.0 Safari/537.36";

/// Default headers sent with every plain HTTP request, before any
/// caller-supplied overrides are merged in.
pub fn default_headers() -> Vec<(&'static str, &'static str)> {
    vec![
        ("User-Agent", USER_AGENT),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Referer", "https://www.google.com/"),
        ("Connection", "keep-alive"),
        ("Upgrade-Insecure-Requests", "1"),
    ]
}

/// Configuration for a scraping session.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL fetched when an operation is called without an explicit target.
    pub base_url: Option<String>,
    /// Minimum interval between outbound requests.
    pub delay: Duration,
    /// Requests-per-minute budget; tightens `delay` when stricter.
    pub max_requests_per_minute: Option<u32>,
    /// Header overrides merged case-insensitively over the defaults.
    pub headers: Vec<(String, String)>,
    /// Propagate failures as errors instead of degrading to absent results.
    pub strict: bool,
    /// Verbose diagnostics (the binary maps this to a debug-level filter).
    pub debug: bool,
    /// Timeout for a single plain HTTP request.
    pub request_timeout: Duration,
    /// Timeout for browser navigation before best-effort capture kicks in.
    pub nav_timeout: Duration,
    /// Extra settle time after browser navigation, for client-side rendering.
    pub settle_wait: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            delay: Duration::ZERO,
            max_requests_per_minute: None,
            headers: Vec::new(),
            strict: false,
            debug: false,
            request_timeout: Duration::from_secs(15),
            nav_timeout: Duration::from_secs(15),
            settle_wait: Duration::from_millis(1500),
        }
    }
}

impl Config {
    /// Config with a base URL and defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// The delay the rate limiter actually enforces: the configured delay,
    /// tightened by the requests-per-minute budget when one is set.
    pub fn effective_delay(&self) -> Duration {
        match self.max_requests_per_minute {
            Some(rpm) if rpm > 0 => {
                let budget = Duration::from_secs_f64(60.0 / f64::from(rpm));
                self.delay.max(budget)
            }
            _ => self.delay,
        }
    }
}
