use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

use cli::FetchArgs;

#[derive(Parser)]
#[command(
    name = "gleaner",
    about = "Resilient page fetching and structured extraction",
    version,
    after_help = "Run 'gleaner <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page, falling back to browser rendering when blocked
    Fetch {
        /// URL to fetch
        url: String,
        /// Skip plain HTTP and render in the headless browser
        #[arg(long)]
        browser: bool,
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Extract the largest matching table from a page
    Table {
        /// URL to fetch
        url: String,
        /// CSS selector for candidate tables (default: table.wikitable)
        #[arg(long, short)]
        selector: Option<String>,
        /// Write the matrix to this CSV file instead of stdout
        #[arg(long, short)]
        output: Option<std::path::PathBuf>,
        /// Skip plain HTTP and render in the headless browser
        #[arg(long)]
        browser: bool,
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Scrape a selector across a multi-page listing
    Pages {
        /// Page URL, or a pattern containing `{}` when --count is given
        url: String,
        /// CSS selector whose text is collected from every page
        selector: String,
        /// Number of pages for pattern mode; omit to follow next-links
        #[arg(long, short)]
        count: Option<u32>,
        /// Page cap when following next-links
        #[arg(long, default_value = "10")]
        max_pages: u32,
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Fetch many URLs concurrently with a shared rate limit
    Batch {
        /// URLs to fetch
        #[arg(required = true)]
        urls: Vec<String>,
        /// Simultaneous fetches
        #[arg(long, short, default_value = "4")]
        workers: usize,
        #[command(flatten)]
        fetch: FetchArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "gleaner=debug" } else { "gleaner=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().expect("static directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    let debug = cli.verbose;
    let result = match cli.command {
        Commands::Fetch { url, browser, fetch } => {
            cli::fetch_cmd::run(&url, browser, &fetch, json, debug).await
        }
        Commands::Table {
            url,
            selector,
            output,
            browser,
            fetch,
        } => {
            cli::table_cmd::run(
                &url,
                selector.as_deref(),
                output.as_ref(),
                browser,
                &fetch,
                json,
                debug,
            )
            .await
        }
        Commands::Pages {
            url,
            selector,
            count,
            max_pages,
            fetch,
        } => cli::pages_cmd::run(&url, &selector, count, max_pages, &fetch, json, debug).await,
        Commands::Batch {
            urls,
            workers,
            fetch,
        } => cli::batch_cmd::run(&urls, workers, &fetch, json, debug).await,
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !json {
            eprintln!("  Error: {e:#}");
        } else {
            println!(
                "{}",
                serde_json::json!({ "error": true, "message": format!("{e:#}") })
            );
        }
        std::process::exit(1);
    }

    result
}
