//! `gleaner pages <url> <selector>` — scrape a multi-page listing.
//!
//! With `--count N` the URL is treated as a pattern whose `{}` is replaced
//! by the 1-based page index. Without it, pagination follows each page's
//! next-link up to `--max-pages`.

use anyhow::{Context, Result};

use gleaner::{scrape_auto_next, scrape_pages, Session};

use crate::cli::FetchArgs;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    url: &str,
    selector: &str,
    count: Option<u32>,
    max_pages: u32,
    args: &FetchArgs,
    json: bool,
    debug: bool,
) -> Result<()> {
    let mut session = Session::new(args.config(debug))?;

    let collected = match count {
        Some(pages) => scrape_pages(&mut session, url, pages, selector).await,
        None => scrape_auto_next(&mut session, url, selector, max_pages).await,
    }
    .context("pagination failed");

    let outcome = match collected {
        Ok(texts) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&texts)?);
            } else {
                eprintln!("  {} matches", texts.len());
                for text in &texts {
                    println!("{text}");
                }
            }
            Ok(())
        }
        Err(e) => Err(e),
    };

    session.close().await?;
    outcome
}
