use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AdMetricsError, Result};

/// 广告实体，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
}

/// 单次点击事件（热分区与冷分区共用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Click {
    pub id: Uuid,
    pub ad_id: Uuid,
    /// 事件时间，可能早于写入时间
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    /// 播放时长（秒）
    pub playback_time: u32,
    /// 写入时间
    pub created_at: DateTime<Utc>,
}

/// 每个广告一行的生命周期累计值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub id: Uuid,
    pub ad_id: Uuid,
    pub total_clicks: i64,
    pub total_playback_time: i64,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// 已封存的自然月汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub id: Uuid,
    pub ad_id: Uuid,
    pub month: u32,
    pub year: i32,
    pub total_clicks: i64,
    pub total_playback_time: i64,
    pub created_at: DateTime<Utc>,
}

/// 按创建时间排序的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = AdMetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AdMetricsError::invalid_argument(format!(
                "Invalid order: '{}'. Valid: asc, desc",
                s
            ))),
        }
    }
}

/// 广告列表过滤与分页条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdFilter {
    /// 名称子串（大小写不敏感）
    pub search: Option<String>,
    pub order: SortOrder,
    /// 从 1 开始
    pub page: u64,
    pub rows: u64,
}

impl Default for AdFilter {
    fn default() -> Self {
        Self {
            search: None,
            order: SortOrder::Desc,
            page: 1,
            rows: 25,
        }
    }
}

impl AdFilter {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.rows)
    }

    /// 规范化后的搜索词（空串视为无搜索）
    ///
    /// 只折叠 ASCII 大小写，与 SQLite 的 `LOWER` 一致。
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_lowercase)
    }
}

/// 点击数与播放时长之和
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub clicks: i64,
    pub playback_time: i64,
}

impl Totals {
    pub fn merge(self, other: Totals) -> Totals {
        Totals {
            clicks: self.clicks + other.clicks,
            playback_time: self.playback_time + other.playback_time,
        }
    }
}

/// 单广告的累计值与窗口值（同一快照内读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdTotals {
    pub lifetime: Totals,
    pub in_range: Totals,
}

/// 全部广告的累计值与窗口值（同一快照内读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FleetTotals {
    pub ad_count: u64,
    pub lifetime: Totals,
    pub in_range: Totals,
    /// 窗口内至少有一次点击的广告数
    pub ads_in_range: u64,
}

/// 连接池快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// 池中已打开的连接数
    pub size: u32,
    pub idle: u32,
}

impl PoolStats {
    /// 正在被借出的连接数
    pub fn in_use(&self) -> u32 {
        self.size.saturating_sub(self.idle)
    }
}

/// 冷热分区行数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClickPartitionCounts {
    pub hot: u64,
    pub cold: u64,
}

impl ClickPartitionCounts {
    pub fn total(&self) -> u64 {
        self.hot + self.cold
    }
}

/// 自然月的时间区间 [start, end)
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = || AdMetricsError::invalid_argument(format!("Invalid month: {}-{}", year, month));

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;

    let to_utc = |d: NaiveDate| {
        d.and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .ok_or_else(invalid)
    };
    Ok((to_utc(start)?, to_utc(end)?))
}

/// 判断某个自然月是否已结束
pub fn month_has_ended(year: i32, month: u32, now: DateTime<Utc>) -> Result<bool> {
    let (_, end) = month_bounds(year, month)?;
    Ok(end <= now)
}

/// 上一个自然月（年, 月）
pub fn previous_month(now: DateTime<Utc>) -> (i32, u32) {
    if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    }
}
