//! Storage status commands

use std::sync::Arc;

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::AnalyticsService;
use crate::storage::AdRepository;

pub async fn ping(storage: Arc<dyn AdRepository>) -> Result<(), CliError> {
    storage.ping().await?;
    println!(
        "{} {}",
        "Storage is reachable:".green(),
        storage.backend_name().blue()
    );
    Ok(())
}

pub async fn partition_counts(
    storage: Arc<dyn AdRepository>,
    ad_id: Option<String>,
) -> Result<(), CliError> {
    let service = AnalyticsService::new(storage);
    let counts = service.partition_counts(ad_id.as_deref()).await?;

    let scope = ad_id.unwrap_or_else(|| "all ads".to_string());
    println!("{} {}", "Click partitions for".green(), scope.blue());
    println!("  hot:   {}", counts.hot);
    println!("  cold:  {}", counts.cold);
    println!("  total: {}", counts.total().to_string().bold());
    Ok(())
}
