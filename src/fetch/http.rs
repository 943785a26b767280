//! Plain-HTTP fetching with soft-block classification.
//!
//! Sites that gate content behind anti-bot walls rarely fail cleanly: they
//! serve 403/429, or a 200 whose body is a challenge page. [`HttpFetcher`]
//! turns every request into an [`Outcome`] so the session can decide between
//! accepting the page, retrying, falling back to a real browser, or failing.

use std::sync::Arc;

use tracing::debug;

use crate::error::TransportError;
use crate::fetch::transport::{Method, Transport, TransportResponse};
use crate::fetch::{FetchResult, Provenance};

/// Body substrings that mark a challenge page even on a 2xx status.
/// Matched against the lowercased body.
const BLOCK_MARKERS: &[&str] = &[
    "captcha",
    "cloudflare",
    "verify you are human",
    "access denied",
];

/// Classified result of one plain-HTTP attempt.
#[derive(Debug)]
pub enum Outcome {
    /// Usable page.
    Success(FetchResult),
    /// Anti-bot wall: blocking status or a challenge marker in the body.
    /// The caller should escalate to browser rendering, not retry.
    Blocked {
        status: u16,
        marker: Option<&'static str>,
    },
    /// The request itself failed; worth retrying as-is.
    Transient(TransportError),
    /// Unacceptable status in strict mode. Not retried.
    Fatal { status: u16, url: String },
}

/// Issues plain requests and classifies what came back.
pub struct HttpFetcher {
    transport: Arc<dyn Transport>,
    strict: bool,
}

impl HttpFetcher {
    pub fn new(transport: Arc<dyn Transport>, strict: bool) -> Self {
        Self { transport, strict }
    }

    /// GET a page and classify the response.
    pub async fn get(&self, url: &str) -> Outcome {
        let resp = match self.transport.request(Method::Get, url, None).await {
            Ok(resp) => resp,
            Err(e) => return Outcome::Transient(e),
        };
        self.classify(url, resp)
    }

    /// POST a form. No block detection here: form endpoints answer with
    /// either a result page or a status error, and only the status decides.
    pub async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Outcome {
        let resp = match self
            .transport
            .request(Method::Post, url, Some(fields))
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Outcome::Transient(e),
        };
        if (200..300).contains(&resp.status) {
            Outcome::Success(success(resp))
        } else {
            Outcome::Fatal {
                status: resp.status,
                url: url.to_string(),
            }
        }
    }

    /// Block checks run before the strict status check: a strict-mode 403 is
    /// still an escalation to the browser, not a hard failure.
    fn classify(&self, url: &str, resp: TransportResponse) -> Outcome {
        if resp.status == 403 || resp.status == 429 {
            debug!(url, status = resp.status, "blocking status");
            return Outcome::Blocked {
                status: resp.status,
                marker: None,
            };
        }

        let lowered = resp.body.to_lowercase();
        if let Some(marker) = BLOCK_MARKERS.iter().copied().find(|m| lowered.contains(m)) {
            debug!(url, marker, "challenge marker in body");
            return Outcome::Blocked {
                status: resp.status,
                marker: Some(marker),
            };
        }

        if self.strict && !(200..300).contains(&resp.status) {
            return Outcome::Fatal {
                status: resp.status,
                url: url.to_string(),
            };
        }

        Outcome::Success(success(resp))
    }
}

fn success(resp: TransportResponse) -> FetchResult {
    FetchResult {
        final_url: resp.final_url,
        status: resp.status,
        body: resp.body,
        provenance: Provenance::Plain,
    }
}
