//! Concurrent multi-URL fetching.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::session::Session;
use crate::fetch::transport::{ReqwestTransport, Transport};
use crate::limiter::RateLimiter;

/// Fans fetches out over per-worker sessions that share one rate limiter
/// and one transport, so the configured request budget spans the whole
/// batch rather than multiplying per worker.
pub struct FetchPool {
    config: Config,
    limiter: Arc<RateLimiter>,
    transport: Arc<dyn Transport>,
}

impl FetchPool {
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.effective_delay()));
        Self {
            config,
            limiter,
            transport,
        }
    }

    /// Fetch every URL with up to `workers` in flight at once. Output order
    /// always matches input order; each entry reports whether the fetch
    /// produced a page. In strict mode the first failure in input order
    /// aborts the batch.
    pub async fn fetch_all(
        &self,
        urls: &[String],
        workers: usize,
    ) -> Result<Vec<(String, bool)>> {
        if urls.is_empty() {
            warn!("no URLs to fetch");
            return Ok(Vec::new());
        }
        if workers < 1 {
            return Err(Error::InvalidInput("workers must be >= 1".into()));
        }

        let results: Vec<Result<(String, bool)>> = stream::iter(urls.iter().cloned())
            .map(|url| {
                let mut session = Session::with_shared(
                    self.config.clone(),
                    Arc::clone(&self.limiter),
                    Arc::clone(&self.transport),
                );
                async move {
                    let ok = session.fetch(Some(&url)).await?.is_some();
                    debug!(url = %url, ok, "worker finished");
                    Ok((url, ok))
                }
            })
            .buffered(workers)
            .collect()
            .await;

        results.into_iter().collect()
    }
}
