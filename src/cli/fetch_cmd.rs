//! `gleaner fetch <url>` — fetch one page through the adaptive pipeline.

use anyhow::{Context, Result};

use gleaner::{FetchOptions, Session};

use crate::cli::FetchArgs;

pub async fn run(url: &str, browser: bool, args: &FetchArgs, json: bool, debug: bool) -> Result<()> {
    let mut session = Session::new(args.config(debug))?;

    let opts = FetchOptions {
        retries: args.retries,
        force_browser: browser,
    };
    let fetched = session
        .fetch_with(Some(url), opts)
        .await
        .context("fetch failed")?;

    let outcome = match fetched {
        Some(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(result)?);
            } else {
                eprintln!(
                    "  {} [{}] {} ({} bytes)",
                    result.final_url,
                    result.status,
                    match result.provenance {
                        gleaner::Provenance::Plain => "plain",
                        gleaner::Provenance::Rendered => "rendered",
                    },
                    result.body.len()
                );
                println!("{}", result.body);
            }
            Ok(())
        }
        None => {
            if json {
                println!("{}", serde_json::json!({ "error": true, "url": url }));
            }
            Err(anyhow::anyhow!("could not fetch {url}"))
        }
    };

    session.close().await?;
    outcome
}
