//! CLI subcommand implementations for the gleaner binary.

pub mod batch_cmd;
pub mod fetch_cmd;
pub mod pages_cmd;
pub mod table_cmd;

use std::time::Duration;

use gleaner::Config;

/// Fetch knobs shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct FetchArgs {
    /// Minimum milliseconds between requests
    #[arg(long, default_value = "0")]
    pub delay_ms: u64,

    /// Requests-per-minute budget (tightens --delay-ms when stricter)
    #[arg(long)]
    pub rpm: Option<u32>,

    /// Extra attempts after a transient network failure
    #[arg(long, default_value = "2")]
    pub retries: u32,

    /// Header override, as "Name: value". Can be repeated.
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Treat failures as errors instead of skipping
    #[arg(long)]
    pub strict: bool,
}

impl FetchArgs {
    /// Build a session configuration from the flags.
    pub fn config(&self, debug: bool) -> Config {
        Config {
            delay: Duration::from_millis(self.delay_ms),
            max_requests_per_minute: self.rpm,
            headers: self.headers.clone(),
            strict: self.strict,
            debug,
            ..Config::default()
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected \"Name: value\", got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
