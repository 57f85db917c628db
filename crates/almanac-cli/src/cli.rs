use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Daily weather lookups with a local cache.
#[derive(Parser)]
#[command(
    name = "almanac",
    version,
    about = "Daily weather lookups, predictions and a local cache"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file (defaults to the platform config dir).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Look up one date. Future dates are predicted from the last ten years.
    Day {
        /// Location as understood by the weather service (e.g. "London,UK").
        location: String,
        /// Date as YYYY-MM-DD.
        date: String,
    },
    /// Fetch a date range and cache every day.
    ///
    /// With a single date, fetches the year ending on that date.
    Range {
        location: String,
        /// First date as YYYY-MM-DD, or the last date when END is omitted.
        #[arg(value_name = "START")]
        first: String,
        /// Last date as YYYY-MM-DD (inclusive).
        end: Option<String>,
    },
    /// Read a cached reading without touching the network.
    Cached {
        /// Date as YYYY-MM-DD.
        date: String,
    },
    /// Show where configuration and the cache live.
    Config,
}
