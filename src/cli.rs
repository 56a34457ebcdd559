//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// admetrics - video ad click tracking and analytics service
#[derive(Parser)]
#[command(name = "admetrics")]
#[command(version)]
#[command(about = "Video ad click tracking and engagement analytics service", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Run a single archival pass and exit
    Archive {
        /// Cutoff timestamp (RFC3339); defaults to now minus retention_days
        #[arg(long)]
        before: Option<String>,
    },

    /// Check that the storage backend is reachable
    Ping,

    /// Seal the monthly aggregate of an ad
    ///
    /// Without year/month the previous calendar month (UTC) is closed.
    CloseMonth {
        /// Ad ID (UUID)
        ad_id: String,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },

    /// Show hot/cold click row counts
    Partitions {
        /// Restrict to one ad (UUID)
        ad_id: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}
