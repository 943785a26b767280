//! `gleaner table <url>` — extract the largest matching table as a matrix.

use std::path::PathBuf;

use anyhow::{Context, Result};

use gleaner::{export, FetchOptions, Session};

use crate::cli::FetchArgs;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    url: &str,
    selector: Option<&str>,
    output: Option<&PathBuf>,
    browser: bool,
    args: &FetchArgs,
    json: bool,
    debug: bool,
) -> Result<()> {
    let mut session = Session::new(args.config(debug))?;

    let opts = FetchOptions {
        retries: args.retries,
        force_browser: browser,
    };
    let fetched = session
        .fetch_with(Some(url), opts)
        .await
        .context("fetch failed")?
        .is_some();
    let outcome = if fetched {
        extract(&session, selector, output, json)
    } else {
        Err(anyhow::anyhow!("could not fetch {url}"))
    };

    session.close().await?;
    outcome
}

fn extract(
    session: &Session,
    selector: Option<&str>,
    output: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let Some(matrix) = session.get_table(selector)? else {
        return Err(anyhow::anyhow!(
            "no table matched `{}`",
            selector.unwrap_or(gleaner::extract::table::DEFAULT_TABLE_SELECTOR)
        ));
    };

    if let Some(path) = output {
        export::save_csv(&matrix, path).context("failed to write CSV")?;
        eprintln!("  {} rows -> {}", matrix.len(), path.display());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&matrix)?);
    } else {
        for row in &matrix {
            println!("{}", row.join("\t"));
        }
    }
    Ok(())
}
