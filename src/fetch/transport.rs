//! HTTP transport seam.
//!
//! The fetch pipeline talks to the network through the [`Transport`] trait
//! so tests can substitute canned responses. [`ReqwestTransport`] is the
//! production implementation: cookie jar, bounded redirects, per-request
//! timeout, and browser-like default headers with caller overrides merged
//! case-insensitively on top.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::{self, Config};
use crate::error::{Error, TransportError};

/// HTTP method supported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Raw response handed back by a transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
    /// URL after redirects.
    pub final_url: String,
}

/// Capability contract the fetch pipeline consumes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request. `form` is url-encoded into the body for POST and
    /// ignored for GET. Errors are transport-level only: any response that
    /// arrives, whatever its status, is returned as a `TransportResponse`.
    async fn request(
        &self,
        method: Method,
        url: &str,
        form: Option<&[(String, String)]>,
    ) -> Result<TransportResponse, TransportError>;

    /// Stream a response body to disk and return the bytes written.
    /// Non-2xx statuses are errors here: a download either succeeds
    /// completely or not at all.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransportError>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client from the session configuration. Default headers are
    /// installed first, then caller overrides; `HeaderName` is
    /// case-insensitive, so an override replaces its default regardless of
    /// spelling.
    pub fn new(cfg: &Config) -> Result<Self, Error> {
        let defaults = config::default_headers();
        let mut headers = HeaderMap::new();
        let pairs = defaults
            .iter()
            .map(|(n, v)| (*n, *v))
            .chain(cfg.headers.iter().map(|(n, v)| (n.as_str(), v.as_str())));
        for (name, value) in pairs {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidInput(format!("invalid header name `{name}`")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidInput(format!("invalid value for header `{name}`")))?;
            headers.insert(header, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(cfg.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        form: Option<&[(String, String)]>,
    ) -> Result<TransportResponse, TransportError> {
        let builder = match method {
            Method::Get => self.client.get(url),
            Method::Post => {
                let fields = form.unwrap_or(&[]);
                self.client.post(url).form(fields)
            }
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp.text().await?;

        Ok(TransportResponse {
            status,
            body,
            final_url,
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransportError> {
        let resp = self.client.get(url).send().await?.error_for_status()?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let mut written = 0u64;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TransportError::Io(e.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        debug!(url, bytes = written, "download complete");
        Ok(written)
    }
}
