//! Resilient page fetching and structured extraction.
//!
//! `gleaner` fetches web pages through an adaptive pipeline — rate-limited
//! plain HTTP with soft-block detection, escalating to headless-browser
//! rendering when a site refuses to serve real content — and extracts
//! structured data from the results, including span-aware reconstruction of
//! HTML tables into rectangular matrices.
//!
//! The central type is [`Session`]: one logical scraping conversation that
//! owns the retry/fallback state machine and the most recently fetched page.
//! [`paginate`](fetch::paginate) walks multi-page listings, [`FetchPool`]
//! fans fetches out over bounded workers sharing one rate limit.
//!
//! ```no_run
//! use gleaner::{Config, Session};
//!
//! # async fn run() -> gleaner::Result<()> {
//! let mut session = Session::new(Config::default())?;
//! if session.fetch(Some("https://example.com/stats")).await?.is_some() {
//!     if let Some(table) = session.get_table(Some("table.data"))? {
//!         println!("{} rows", table.len());
//!     }
//! }
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod limiter;

pub use config::Config;
pub use error::{Error, Result};
pub use extract::{clean_text, Document, TableMatrix};
pub use fetch::download::{download_file, download_images};
pub use fetch::paginate::{scrape_auto_next, scrape_pages};
pub use fetch::pool::FetchPool;
pub use fetch::session::{FetchOptions, Session};
pub use fetch::{FetchResult, Provenance};
pub use limiter::RateLimiter;
