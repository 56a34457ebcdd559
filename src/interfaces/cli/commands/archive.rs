//! One-shot archival pass

use std::sync::Arc;

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::archive::ArchivalTask;
use crate::interfaces::cli::CliError;
use crate::metrics_core::default_recorder;
use crate::storage::AdRepository;

pub async fn archive(
    storage: Arc<dyn AdRepository>,
    before: Option<String>,
) -> Result<(), CliError> {
    let config = crate::config::get_config();
    let task = ArchivalTask::new(storage, default_recorder(), &config.archival)?;

    let report = match before {
        Some(raw) => {
            let cutoff = DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| CliError::ParseError(format!("invalid --before '{}': {}", raw, e)))?
                .with_timezone(&Utc);
            task.archive_before(cutoff).await?
        }
        None => task.run_once().await?,
    };

    println!(
        "{} {} {} {}",
        "Archived".green(),
        report.archived.to_string().bold(),
        "clicks older than".green(),
        report.cutoff.to_rfc3339().blue()
    );
    println!("  {} {:?}", "Took".dimmed(), report.duration);
    Ok(())
}
