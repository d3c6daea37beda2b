//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Foreground activity tracker.
///
/// Samples the frontmost application and browser tab, aggregates the samples
/// into fixed time windows, and persists a merged timeline of activity
/// blocks.
#[derive(Debug, Parser)]
#[command(name = "ft", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the tracker loop and the HTTP surface.
    Run,

    /// Print a day's activity blocks.
    Report {
        /// Day to report (YYYY-MM-DD, default: today).
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write a day's blocks to a CSV or iCalendar file.
    Export {
        /// Day to export (YYYY-MM-DD, default: today).
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output path (default: activity-<day>.<ext> in the working
        /// directory).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Delete a day's blocks before the first label matching a substring.
    Trim {
        /// Day to trim (YYYY-MM-DD, default: today).
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Case-insensitive substring marking the first block to keep.
        #[arg(long, default_value = "firefox")]
        substring: String,
    },
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated `start,end,title` rows.
    Csv,
    /// iCalendar, one event per block.
    Ical,
}
