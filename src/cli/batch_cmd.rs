//! `gleaner batch <urls>...` — fetch many URLs with bounded parallelism.

use anyhow::{Context, Result};

use gleaner::FetchPool;

use crate::cli::FetchArgs;

pub async fn run(
    urls: &[String],
    workers: usize,
    args: &FetchArgs,
    json: bool,
    debug: bool,
) -> Result<()> {
    let pool = FetchPool::new(args.config(debug))?;
    let results = pool
        .fetch_all(urls, workers)
        .await
        .context("batch fetch failed")?;

    if json {
        let rows: Vec<_> = results
            .iter()
            .map(|(url, ok)| serde_json::json!({ "url": url, "ok": ok }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (url, ok) in &results {
            println!("{} {}", if *ok { "ok  " } else { "FAIL" }, url);
        }
        let failed = results.iter().filter(|(_, ok)| !ok).count();
        eprintln!("  {} fetched, {} failed", results.len() - failed, failed);
    }
    Ok(())
}
