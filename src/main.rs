// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use log::info;

use bounded_collector::bidding::{Auction, get_bidder};
use bounded_collector::checksum::verify::{VerifyJob, status_line, summary_line};
use bounded_collector::config::{Config, load_config};
use bounded_collector::metrics::METRICS;
use bounded_collector::sleepsort;
use bounded_collector::util::{format_duration, timed};

#[derive(Parser)]
#[command(name = "bounded-collector")]
#[command(about = "Deadline-bounded selection and fan-out verification")]
struct Cli {
    /// JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one auction for URL, falling back to the default bid when late
    Bid {
        url: String,
        /// Override bidding.deadline_ms
        #[arg(long)]
        deadline_ms: Option<u64>,
    },
    /// Check every file listed in the signature index (exit 1 on mismatch)
    Verify {
        /// Directory holding the index and the files
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Sort integers by sleeping on them concurrently
    Sort { values: Vec<u64> },
}

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Parse the command line
// - Load configuration
// - Initialise logging
// - Run the requested command and map its verdict to an exit status
//
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut cfg = load_config(&cli.config)?;

    // RUST_LOG wins over the config flag.
    let default_level = if cfg.debug_log() { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if !cli.config.exists() {
        info!("no config at {}, using defaults", cli.config.display());
    }

    let code = match cli.command {
        Commands::Bid { url, deadline_ms } => {
            if let Some(ms) = deadline_ms {
                cfg.bidding.deadline_ms = ms;
                cfg.validate()?;
            }
            run_bid(&cfg, &url).await?
        }
        Commands::Verify { root } => run_verify(&cfg, root).await?,
        Commands::Sort { values } => {
            println!("{:?}", sleepsort::sleep_sort(&values).await);
            ExitCode::SUCCESS
        }
    };

    info!("[METRICS] {}", METRICS.summary());
    Ok(code)
}

async fn run_bid(cfg: &Config, url: &str) -> anyhow::Result<ExitCode> {
    let bidding = &cfg.bidding;
    let bidder = get_bidder(&bidding.bidder, bidding.bidder_max_delay())
        .ok_or_else(|| anyhow!("bidder '{}' is not supported", bidding.bidder))?;

    let auction = Auction::new(bidder, bidding);
    let (selection, took) = timed(auction.bid_on(url)).await;

    println!("{}", selection.value);
    info!(
        "auction finished in {} via {:?}",
        format_duration(took),
        selection.source
    );
    Ok(ExitCode::SUCCESS)
}

async fn run_verify(cfg: &Config, root: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let job = VerifyJob {
        root: cfg.verify_root(root.as_deref()),
        index_file: cfg.verify.index_file.clone(),
        file_suffix: cfg.verify.file_suffix.clone(),
        algorithm: cfg.verify.algorithm,
    };

    let report = job
        .run(|delivery| println!("{}", status_line(delivery)))
        .await
        .with_context(|| format!("verifying files under {}", job.root.display()))?;

    println!("{}", summary_line(&report));
    info!("verification started at {}", report.started_at.to_rfc3339());

    if report.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
