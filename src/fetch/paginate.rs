//! Multi-page scraping drivers.
//!
//! Two strategies: numbered URL patterns (`.../page/{}`) and following a
//! "next" link discovered on each page. Both accumulate the flattened texts
//! of a selector across pages and stop early when a page cannot be fetched.

use tracing::{debug, error};
use url::Url;

use crate::error::{Error, Result};
use crate::extract::document::{element_text, Document};
use crate::fetch::session::Session;

/// Scrape `pages` pages of a numbered URL pattern, substituting the first
/// `{}` with the 1-based page index. Per-page failures are logged and
/// skipped unless the session is strict.
pub async fn scrape_pages(
    session: &mut Session,
    url_pattern: &str,
    pages: u32,
    selector: &str,
) -> Result<Vec<String>> {
    if pages < 1 {
        return Err(Error::InvalidInput("pages must be >= 1".into()));
    }

    let mut results = Vec::new();
    for page in 1..=pages {
        debug!(page, total = pages, "scraping page");
        let url = url_pattern.replacen("{}", &page.to_string(), 1);
        match scrape_one(session, &url, selector).await {
            Ok(Some(mut texts)) => results.append(&mut texts),
            Ok(None) => {}
            Err(e) => {
                if session.config().strict {
                    return Err(e);
                }
                error!(page, error = %e, "failed to scrape page");
            }
        }
    }
    Ok(results)
}

async fn scrape_one(
    session: &mut Session,
    url: &str,
    selector: &str,
) -> Result<Option<Vec<String>>> {
    if session.fetch(Some(url)).await?.is_none() {
        return Ok(None);
    }
    session.select_text(selector).map(Some)
}

/// Scrape up to `max_pages` pages starting at `url`, following each page's
/// next-link. Stops when a page fails to fetch, no next-link is found, or
/// the first-priority candidate lacks a usable target.
pub async fn scrape_auto_next(
    session: &mut Session,
    url: &str,
    selector: &str,
    max_pages: u32,
) -> Result<Vec<String>> {
    if max_pages < 1 {
        return Err(Error::InvalidInput("max_pages must be >= 1".into()));
    }

    let mut results = Vec::new();
    let mut current = url.to_string();
    for page in 1..=max_pages {
        debug!(page, max_pages, url = %current, "following pagination");
        if session.fetch(Some(&current)).await?.is_none() {
            break;
        }
        let Some(result) = session.current() else {
            break;
        };
        let base = result.final_url.clone();
        let doc = result.document();
        results.extend(doc.select_text(selector)?);

        match next_link(&doc, &base)? {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(results)
}

/// Locate the page's next-link by priority: an anchor whose text contains
/// "next", then `a[rel~="next"]`, then `li.next a`, then `a.next`. The first
/// candidate found decides; if its href is missing or empty, pagination
/// stops rather than trying the lower priorities.
fn next_link(doc: &Document, current_url: &str) -> Result<Option<String>> {
    let candidate = doc
        .select_all("a")?
        .into_iter()
        .find(|a| element_text(a).to_lowercase().contains("next"))
        .or(doc.select_one(r#"a[rel~="next"]"#)?)
        .or(doc.select_one("li.next a")?)
        .or(doc.select_one("a.next")?);

    let Some(anchor) = candidate else {
        debug!("no next link found, stopping pagination");
        return Ok(None);
    };

    let href = anchor.value().attr("href").unwrap_or("").trim();
    if href.is_empty() {
        debug!("next link lacks an href, stopping pagination");
        return Ok(None);
    }

    match Url::parse(current_url).and_then(|base| base.join(href)) {
        Ok(resolved) => Ok(Some(resolved.to_string())),
        Err(e) => {
            debug!(href, error = %e, "next link does not resolve");
            Ok(None)
        }
    }
}
