//! Lead scraper — binary entrypoint.
//! Queries subreddit searches and forum feeds once, prints the merged
//! newest-first listing on stdout and per-source warnings on stderr.

use anyhow::{Context, Result};
use clap::Parser;
use lead_scraper::ingest::{self, providers::providers_from_registry, DEFAULT_LIMIT};
use lead_scraper::{render, HttpFetcher, OutputMode, SourceRegistry};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pause before the first request, for repeated runs from cron/CI.
const COURTESY_DELAY: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(
    name = "lead-scraper",
    version,
    about = "Scrape subreddit searches and forum RSS feeds for VPN-focused discussions."
)]
struct Cli {
    /// Maximum posts to fetch per source
    #[arg(long, default_value_t = DEFAULT_LIMIT as i64, allow_negative_numbers = true)]
    limit: i64,

    /// Output results as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Source table (TOML or JSON); defaults to $LEAD_SOURCES_PATH, config/, then built-ins
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Skip the courtesy pause before the first request
    #[arg(long)]
    no_delay: bool,

    /// Stop querying further sources after this many seconds
    #[arg(long)]
    deadline: Option<u64>,

    /// Enable diagnostic tracing on stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Tracing stays off unless asked for (`-v` or LEAD_SCRAPER_LOG=1), so the
/// `[warning] ...` lines remain the only default stderr output.
fn enable_tracing(verbose: bool) {
    let env_flag = std::env::var("LEAD_SCRAPER_LOG")
        .ok()
        .is_some_and(|v| v == "1");
    if !(verbose || env_flag) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lead_scraper=debug,ingest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

async fn shutdown_signal(deadline: Option<u64>) {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available; rely on the deadline alone.
            std::future::pending::<()>().await;
        }
    };
    match deadline {
        Some(secs) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
            }
        }
        None => ctrl_c.await,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let registry = match &cli.sources {
        Some(p) => SourceRegistry::load_from(p)?,
        None => SourceRegistry::load_default()?,
    };
    let providers = providers_from_registry(&registry);
    let fetcher = HttpFetcher::new().context("building HTTP client")?;
    let limit = usize::try_from(cli.limit.max(1)).unwrap_or(DEFAULT_LIMIT);

    if !cli.no_delay {
        tokio::time::sleep(COURTESY_DELAY).await;
    }

    let collected = ingest::collect_leads_until(
        &providers,
        &fetcher,
        limit,
        shutdown_signal(cli.deadline),
    )
    .await?;

    for diag in &collected.diagnostics {
        eprintln!("{diag}");
    }
    if collected.interrupted {
        eprintln!("[warning] interrupted before all sources were queried; showing partial results.");
    }

    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Plain
    };
    println!("{}", render(&collected.leads, mode)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    enable_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("[error] Unexpected failure: {e:#}");
        std::process::exit(1);
    }
}
