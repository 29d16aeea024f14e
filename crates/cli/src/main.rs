//! True Anomaly CLI
//!
//! A command-line tool for flagging bursts and gaps in entity, pair and
//! source event streams, either locally over an events file or through the
//! analytics server.

mod client;
mod commands;
mod config;
mod output;

use anomaly_lib::{AnomalyParams, BurstParams, GapParams, Selector};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use commands::analytics::{self, AnalyticsRequest, Backend};
use commands::seed;

/// True Anomaly temporal analytics CLI
#[derive(Parser)]
#[command(name = "ta")]
#[command(author, version, about = "Temporal anomaly analytics for investigative event streams", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via TA_API_URL env var)
    #[arg(long, env = "TA_API_URL")]
    pub api_url: Option<String>,

    /// Analyze a local events file (JSON array or JSON lines) instead of calling the API
    #[arg(long, env = "TA_EVENTS")]
    pub events: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct BurstArgs {
    /// Width of each time bucket in days
    #[arg(long, default_value_t = 7.0)]
    pub bucket_width_days: f64,

    /// Z-score a bucket must reach to count as a burst
    #[arg(long, default_value_t = 1.5)]
    pub z_threshold: f64,
}

impl From<BurstArgs> for BurstParams {
    fn from(args: BurstArgs) -> Self {
        BurstParams {
            bucket_width_days: args.bucket_width_days,
            z_threshold: args.z_threshold,
        }
    }
}

#[derive(Args, Clone)]
pub struct GapArgs {
    /// Minimum silence in days to report
    #[arg(long, default_value_t = 30.0)]
    pub threshold_days: f64,

    /// Report trailing silence up to this RFC 3339 instant
    #[arg(long)]
    pub observation_end: Option<DateTime<Utc>>,
}

impl From<GapArgs> for GapParams {
    fn from(args: GapArgs) -> Self {
        GapParams {
            threshold_days: args.threshold_days,
            observation_end: args.observation_end,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find unusually dense periods of activity
    Bursts {
        /// Stream selector, e.g. entity:alice, pair:alice|bob, source:flight_logs
        #[arg(long, short)]
        selector: Selector,

        #[command(flatten)]
        burst: BurstArgs,
    },

    /// Find unusually long stretches of silence
    Gaps {
        /// Stream selector, e.g. entity:alice, pair:alice|bob, source:flight_logs
        #[arg(long, short)]
        selector: Selector,

        #[command(flatten)]
        gap: GapArgs,
    },

    /// Bursts and gaps merged into one timeline
    Anomalies {
        /// Stream selector, e.g. entity:alice, pair:alice|bob, source:flight_logs
        #[arg(long, short)]
        selector: Selector,

        #[command(flatten)]
        burst: BurstArgs,

        #[command(flatten)]
        gap: GapArgs,
    },

    /// Print demo events as JSON lines
    Seed {
        /// Start of the demo stream (RFC 3339)
        #[arg(long)]
        base: Option<DateTime<Utc>>,

        /// Output file path
        #[arg(long, short)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;

    let (selector, request) = match cli.command {
        Commands::Seed { base, output } => return seed::seed(base, output),
        Commands::Bursts { selector, burst } => (selector, AnalyticsRequest::Bursts(burst.into())),
        Commands::Gaps { selector, gap } => (selector, AnalyticsRequest::Gaps(gap.into())),
        Commands::Anomalies {
            selector,
            burst,
            gap,
        } => (
            selector,
            AnalyticsRequest::Anomalies(AnomalyParams {
                burst: burst.into(),
                gap: gap.into(),
            }),
        ),
    };

    let backend = match config.events_path(cli.events) {
        Some(path) => Backend::local(&path)?,
        None => Backend::remote(&config.api_url(cli.api_url))?,
    };

    analytics::run(&backend, selector, request, cli.format).await
}
