//! `slots` CLI — find mutually free calendar slots from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Five business-hour suggestions over the next week, busy data from a file
//! slots suggest --credential alice.json --days 7
//!
//! # Hourly slots in a range for one participant
//! slots range --credential alice.json --start 2024-01-01T09:00:00Z --end 2024-01-01T18:00:00Z
//!
//! # Hourly slots free for both participants
//! slots common --credential-a alice.json --credential-b bob.json \
//!     --start 2024-01-01T09:00:00Z --end 2024-01-01T18:00:00Z --max-count 5
//!
//! # Is one exact range free?
//! slots check --credential alice.json --start 2024-01-01T10:00:00Z --end 2024-01-01T11:00:00Z
//!
//! # Against Google Calendar, with OAuth access tokens as credentials
//! slots --source google suggest --credential "$TOKEN" --days 30
//! ```
//!
//! Responses are printed to stdout as JSON. A failed request prints
//! `{"error": ...}` and exits with 2 for invalid input, 1 otherwise.

mod source;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use slot_engine::service::{
    CheckRequest, CommonRangeRequest, ErrorResponse, EventsRequest, RangeRequest,
    SingleWindowRequest,
};
use slot_engine::{
    parse_timestamp, Clock, EventSource, FinderConfig, FixedClock, GoogleCalendarSource,
    Scheduler, SlotError,
};
use tracing_subscriber::EnvFilter;

use crate::source::{CliSource, FileSource};

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Find mutually free one-hour calendar slots"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Finder configuration file (JSON)
    #[arg(long, env = "SLOTS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// IANA timezone for business hours and all-day events (overrides config)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Treat this ISO-8601 instant as the current time
    #[arg(long, global = true)]
    now: Option<String>,

    /// Where busy data comes from
    #[arg(long, value_enum, default_value_t = SourceKind::File, global = true)]
    source: SourceKind,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Credentials are paths to JSON event files
    File,
    /// Credentials are Google Calendar OAuth access tokens
    Google,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest business-hour slots over the coming days
    Suggest {
        #[arg(long, env = "SLOTS_CREDENTIAL")]
        credential: Option<String>,
        /// Length of the search window in days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Suggest hourly slots in a range for one participant
    Range {
        #[arg(long, env = "SLOTS_CREDENTIAL")]
        credential: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        max_count: Option<usize>,
    },
    /// Suggest hourly slots in a range free for two participants
    Common {
        #[arg(long, env = "SLOTS_CREDENTIAL_A")]
        credential_a: Option<String>,
        #[arg(long, env = "SLOTS_CREDENTIAL_B")]
        credential_b: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        max_count: Option<usize>,
    },
    /// Check whether an exact range is free
    Check {
        #[arg(long, env = "SLOTS_CREDENTIAL")]
        credential: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// List the raw events in a range
    Events {
        #[arg(long, env = "SLOTS_CREDENTIAL")]
        credential: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.timezone.as_deref())?;
    let now = match cli.now.as_deref() {
        Some(raw) => parse_timestamp(raw, config.timezone)
            .with_context(|| format!("Invalid --now value: {}", raw))?,
        None => Utc::now(),
    };
    let source = match cli.source {
        SourceKind::File => CliSource::File(FileSource::new(config.timezone)),
        SourceKind::Google => CliSource::Google(GoogleCalendarSource::new()),
    };
    let scheduler = Scheduler::new(source, config)
        .context("Invalid finder configuration")?
        .with_clock(FixedClock(now));

    match execute(&scheduler, cli.command).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) => {
            let body = ErrorResponse::from(&e);
            println!("{}", serde_json::to_string_pretty(&body)?);
            process::exit(if e.is_validation() { 2 } else { 1 });
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

/// Load the finder configuration from `path` (or defaults) and apply the
/// `--timezone` override.
fn load_config(path: Option<&std::path::Path>, timezone: Option<&str>) -> Result<FinderConfig> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            FinderConfig::from_json(&json)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => FinderConfig::default(),
    };
    if let Some(name) = timezone {
        let tz: Tz = name
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown timezone: '{}'", name))?;
        config = config.with_timezone(tz);
    }
    Ok(config)
}

/// Run one subcommand and return its response body.
async fn execute<S: EventSource, C: Clock>(
    scheduler: &Scheduler<S, C>,
    command: Commands,
) -> Result<serde_json::Value, SlotError> {
    let body = match command {
        Commands::Suggest { credential, days } => serde_json::to_value(
            scheduler
                .suggest(&SingleWindowRequest {
                    credential,
                    window_days: days,
                })
                .await?,
        )?,
        Commands::Range {
            credential,
            start,
            end,
            max_count,
        } => serde_json::to_value(
            scheduler
                .suggest_in_range(&RangeRequest {
                    credential,
                    start,
                    end,
                    max_count,
                })
                .await?,
        )?,
        Commands::Common {
            credential_a,
            credential_b,
            start,
            end,
            max_count,
        } => serde_json::to_value(
            scheduler
                .suggest_common(&CommonRangeRequest {
                    credential_a,
                    credential_b,
                    start,
                    end,
                    max_count,
                })
                .await?,
        )?,
        Commands::Check {
            credential,
            start,
            end,
        } => serde_json::to_value(
            scheduler
                .check(&CheckRequest {
                    credential,
                    start,
                    end,
                })
                .await?,
        )?,
        Commands::Events {
            credential,
            start,
            end,
        } => serde_json::to_value(
            scheduler
                .list_events(&EventsRequest {
                    credential,
                    start,
                    end,
                })
                .await?,
        )?,
    };
    Ok(body)
}
