//! Spider-Engine main entry point
//!
//! This is the command-line interface for the Spider-Engine site crawler.

use clap::Parser;
use spider_engine::config::{load_config, SpiderConfig};
use spider_engine::{Spider, Traversal};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Spider-Engine: a recursive, concurrent site crawler
///
/// Starting from the seed URL, every page is fetched once and every link found on it is
/// followed. One line is printed per fetched page: its URL and title, tab separated.
#[derive(Parser, Debug)]
#[command(name = "spider-engine")]
#[command(version)]
#[command(about = "A recursive, concurrent site crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "SEED")]
    seed: Url,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => SpiderConfig::default(),
    };

    let traversal = Traversal::new()
        .on_page(|page| println!("{}\t{}", page.url(), page.title().trim()))
        .on_error(|url, error| {
            if !error.is_cancelled() {
                tracing::warn!("Error crawling {}: {}", url, error);
            }
        });
    let spider = Spider::new(&config, traversal)?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());
    let reporter = spawn_progress_reporter(spider.clone(), cancel.clone());

    let result = spider.run(cli.seed, cancel.clone()).await;
    reporter.abort();
    result?;

    println!("Finished: {}", spider.progress());

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spider_engine=info,warn"),
            1 => EnvFilter::new("spider_engine=debug,info"),
            2 => EnvFilter::new("spider_engine=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancels the run on the first Ctrl-C
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling crawl");
            cancel.cancel();
        }
    });
}

/// Logs live progress once per second while the run is active
fn spawn_progress_reporter(
    spider: Spider,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => tracing::info!("Progress: {}", spider.progress()),
            }
        }
    })
}
