//! CLI interface module
//!
//! One-shot maintenance commands that talk to storage directly.

pub mod commands;

use std::fmt;
use std::sync::Arc;

use crate::cli::{Commands, ConfigCommands};
use crate::errors::AdMetricsError;
use crate::storage::{AdRepository, StorageFactory};
use commands::{archive, close_month, config_generate, partition_counts, ping};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<AdMetricsError> for CliError {
    fn from(err: AdMetricsError) -> Self {
        match err {
            AdMetricsError::InvalidArgument(msg) => CliError::ParseError(msg),
            AdMetricsError::NotFound(msg) => CliError::CommandError(msg),
            other => CliError::StorageError(other.to_string()),
        }
    }
}

async fn open_storage() -> Result<Arc<dyn AdRepository>, CliError> {
    StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Serve => crate::runtime::modes::server::run_server()
            .await
            .map_err(|e| CliError::CommandError(e.to_string())),
        // 生成配置不需要数据库连接
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force).await,
        Commands::Ping => ping(open_storage().await?).await,
        Commands::Archive { before } => archive(open_storage().await?, before).await,
        Commands::CloseMonth {
            ad_id,
            year,
            month,
        } => close_month(open_storage().await?, ad_id, year, month).await,
        Commands::Partitions { ad_id } => partition_counts(open_storage().await?, ad_id).await,
    }
}
