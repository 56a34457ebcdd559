//! Analytics service layer
//!
//! 生命周期值直接读取累计值表，窗口值在同一快照内扫描冷热两个分区。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{AdMetricsError, Result};
use crate::storage::models::month_has_ended;
use crate::storage::{AdRepository, ClickPartitionCounts, MonthlyAggregate};
use crate::utils::validation::parse_ad_id;

// ============ 公共类型定义 ============

/// 统计窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Minute,
    #[default]
    Hour,
    Day,
    Week,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Minute => "minute",
            Period::Hour => "hour",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// 缺省为 hour
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Period::default()),
            Some(s) => s.parse(),
        }
    }

    /// 窗口起点（含）
    ///
    /// month 按自然月回退，落在不存在的日期时取当月最后一天。
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Minute => now - Duration::minutes(1),
            Period::Hour => now - Duration::hours(1),
            Period::Day => now - Duration::hours(24),
            Period::Week => now - Duration::days(7),
            Period::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(now - Duration::days(30)),
        }
    }
}

impl FromStr for Period {
    type Err = AdMetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "minute" => Ok(Period::Minute),
            "hour" => Ok(Period::Hour),
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            _ => Err(AdMetricsError::invalid_argument("Invalid period")),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 除数为 0 时返回 0
fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// 单广告分析数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdAnalytics {
    pub ad_id: Uuid,
    pub total_clicks: i64,
    pub total_playback_time: i64,
    pub average_playback_time: f64,
    pub period: Period,
    pub total_clicks_in_range: i64,
    pub total_playback_time_in_range: i64,
    pub average_playback_time_in_range: f64,
}

/// 全部广告分析数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetAnalytics {
    pub total_clicks: i64,
    pub average_clicks_per_ad: f64,
    pub total_playback_time: i64,
    pub average_playback_time: f64,
    pub period: Period,
    pub total_clicks_in_range: i64,
    pub average_clicks_per_ad_in_range: f64,
    pub total_playback_time_in_range: i64,
    pub average_playback_time_in_range: f64,
}

// ============ AnalyticsService ============

pub struct AnalyticsService {
    storage: Arc<dyn AdRepository>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<dyn AdRepository>) -> Self {
        Self { storage }
    }

    pub async fn get_ad_analytics(&self, raw_id: &str, period: Option<&str>) -> Result<AdAnalytics> {
        let ad_id = parse_ad_id(raw_id)?;
        let period = Period::parse(period)?;
        let since = period.window_start(Utc::now());

        let totals = self.storage.ad_totals(ad_id, since).await?;

        Ok(AdAnalytics {
            ad_id,
            total_clicks: totals.lifetime.clicks,
            total_playback_time: totals.lifetime.playback_time,
            average_playback_time: ratio(totals.lifetime.playback_time, totals.lifetime.clicks),
            period,
            total_clicks_in_range: totals.in_range.clicks,
            total_playback_time_in_range: totals.in_range.playback_time,
            average_playback_time_in_range: ratio(
                totals.in_range.playback_time,
                totals.in_range.clicks,
            ),
        })
    }

    pub async fn get_ads_analytics(&self, period: Option<&str>) -> Result<FleetAnalytics> {
        let period = Period::parse(period)?;
        let since = period.window_start(Utc::now());

        let fleet = self.storage.fleet_totals(since).await?;

        Ok(FleetAnalytics {
            total_clicks: fleet.lifetime.clicks,
            average_clicks_per_ad: ratio(fleet.lifetime.clicks, fleet.ad_count as i64),
            total_playback_time: fleet.lifetime.playback_time,
            average_playback_time: ratio(fleet.lifetime.playback_time, fleet.lifetime.clicks),
            period,
            total_clicks_in_range: fleet.in_range.clicks,
            average_clicks_per_ad_in_range: ratio(
                fleet.in_range.clicks,
                fleet.ads_in_range as i64,
            ),
            total_playback_time_in_range: fleet.in_range.playback_time,
            average_playback_time_in_range: ratio(
                fleet.in_range.playback_time,
                fleet.in_range.clicks,
            ),
        })
    }

    /// 封存已结束的自然月
    pub async fn close_month(&self, raw_id: &str, year: i32, month: u32) -> Result<MonthlyAggregate> {
        self.close_month_at(raw_id, year, month, Utc::now()).await
    }

    pub async fn close_month_at(
        &self,
        raw_id: &str,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> Result<MonthlyAggregate> {
        let ad_id = parse_ad_id(raw_id)?;
        if !month_has_ended(year, month, now)? {
            return Err(AdMetricsError::invalid_argument(format!(
                "Month {}-{:02} has not ended yet",
                year, month
            )));
        }
        self.storage.close_month(ad_id, year, month, now).await
    }

    pub async fn list_monthly(&self, raw_id: &str) -> Result<Vec<MonthlyAggregate>> {
        let ad_id = parse_ad_id(raw_id)?;
        if self.storage.get_ad(ad_id).await?.is_none() {
            return Err(AdMetricsError::not_found("Ad not found"));
        }
        self.storage.list_monthly_aggregates(ad_id).await
    }

    /// 冷热分区行数，`raw_id` 为空时统计全部广告
    pub async fn partition_counts(&self, raw_id: Option<&str>) -> Result<ClickPartitionCounts> {
        let ad_id = raw_id.map(parse_ad_id).transpose()?;
        self.storage.click_partition_counts(ad_id).await
    }
}
