//! The adaptive fetch pipeline.
//!
//! Plain HTTP first, with soft-block detection; headless browser rendering
//! as the fallback when a site refuses to serve real content over plain
//! HTTP. [`session::Session`] composes the pieces into one retry/fallback
//! state machine, [`paginate`] and [`pool`] drive it across many pages.

pub mod browser;
pub mod download;
pub mod http;
pub mod paginate;
pub mod pool;
pub mod session;
pub mod transport;

use serde::Serialize;

use crate::extract::document::Document;

/// Where a fetched document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Plain HTTP retrieval.
    Plain,
    /// Full browser rendering. Carries a synthetic 200 status because
    /// browser-mode fetches have no real protocol status.
    Rendered,
}

/// One successful retrieval: the final URL, status, raw body, and how the
/// body was obtained. Superseded by the next fetch on the same session.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    /// URL after redirects (plain) or the navigation target (rendered).
    pub final_url: String,
    /// HTTP status code; always 200 for rendered results.
    pub status: u16,
    /// Raw response body or rendered page HTML.
    pub body: String,
    /// Plain HTTP or browser rendering.
    pub provenance: Provenance,
}

impl FetchResult {
    /// Parse the body into a document rooted at this result's final URL.
    ///
    /// Parsing happens per call: the parsed tree is not `Send`, so it is
    /// never stored on the session, only materialized for extraction.
    pub fn document(&self) -> Document {
        Document::parse(&self.body, Some(&self.final_url))
    }
}
