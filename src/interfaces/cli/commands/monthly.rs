//! Close a calendar month for one ad

use std::sync::Arc;

use chrono::Utc;
use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::AnalyticsService;
use crate::storage::AdRepository;
use crate::storage::models::previous_month;

pub async fn close_month(
    storage: Arc<dyn AdRepository>,
    ad_id: String,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<(), CliError> {
    let now = Utc::now();
    let (year, month) = match (year, month) {
        (Some(y), Some(m)) => (y, m),
        (None, None) => previous_month(now),
        _ => {
            return Err(CliError::ParseError(
                "--year and --month must be given together".to_string(),
            ));
        }
    };

    let service = AnalyticsService::new(storage);
    let sealed = service.close_month_at(&ad_id, year, month, now).await?;

    println!(
        "{} {} {}",
        "Month closed:".green(),
        format!("{}-{:02}", sealed.year, sealed.month).blue(),
        sealed.ad_id.to_string().dimmed()
    );
    println!(
        "  clicks: {}  playback: {}s",
        sealed.total_clicks.to_string().bold(),
        sealed.total_playback_time
    );
    Ok(())
}
