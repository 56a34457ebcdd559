//! 内存存储
//!
//! 单把互斥锁包住全部状态，每个操作在锁内完成，等价于一个串行化事务。
//! 用于服务层与 HTTP 层测试，以及 `memory://` 数据库 URL。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::errors::{AdMetricsError, Result};
use crate::storage::models::{
    Ad, AdFilter, AdTotals, Aggregate, Click, ClickPartitionCounts, FleetTotals, MonthlyAggregate,
    SortOrder, Totals, month_bounds,
};
use crate::storage::repository::AdRepository;

#[derive(Default)]
struct MemoryState {
    ads: HashMap<Uuid, Ad>,
    aggregates: HashMap<Uuid, Aggregate>,
    hot: HashMap<Uuid, Click>,
    cold: HashMap<Uuid, Click>,
    monthly: HashMap<(Uuid, i32, u32), MonthlyAggregate>,
}

fn window_totals<'a>(
    clicks: impl Iterator<Item = &'a Click>,
    ad_id: Option<Uuid>,
    from: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> Totals {
    clicks
        .filter(|c| ad_id.is_none_or(|id| c.ad_id == id))
        .filter(|c| c.timestamp >= from && until.is_none_or(|u| c.timestamp < u))
        .fold(Totals::default(), |acc, c| Totals {
            clicks: acc.clicks + 1,
            playback_time: acc.playback_time + i64::from(c.playback_time),
        })
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 删除某个广告的累计值行（故障注入）
    pub fn remove_aggregate(&self, ad_id: Uuid) -> bool {
        self.state.lock().aggregates.remove(&ad_id).is_some()
    }
}

#[async_trait]
impl AdRepository for MemoryStorage {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_ad(&self, ad: &Ad) -> Result<()> {
        let mut state = self.state.lock();
        if state.ads.contains_key(&ad.id) {
            return Err(AdMetricsError::transaction_failed(format!(
                "创建广告失败: 重复的 id {}",
                ad.id
            )));
        }
        state.ads.insert(ad.id, ad.clone());
        state.aggregates.insert(
            ad.id,
            Aggregate {
                id: Uuid::new_v4(),
                ad_id: ad.id,
                total_clicks: 0,
                total_playback_time: 0,
                updated_at: ad.created_at,
                created_at: ad.created_at,
            },
        );
        Ok(())
    }

    async fn get_ad(&self, id: Uuid) -> Result<Option<Ad>> {
        Ok(self.state.lock().ads.get(&id).cloned())
    }

    async fn list_ads(&self, filter: &AdFilter) -> Result<Vec<Ad>> {
        let term = filter.search_term();
        let state = self.state.lock();

        let mut ads: Vec<Ad> = state
            .ads
            .values()
            .filter(|ad| {
                term.as_deref()
                    .is_none_or(|t| ad.name.to_ascii_lowercase().contains(t))
            })
            .cloned()
            .collect();

        ads.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        if filter.order == SortOrder::Desc {
            ads.reverse();
        }

        Ok(ads
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.rows as usize)
            .collect())
    }

    async fn count_ads(&self, search: Option<&str>) -> Result<u64> {
        let filter = AdFilter {
            search: search.map(str::to_string),
            ..AdFilter::default()
        };
        let term = filter.search_term();
        let state = self.state.lock();
        Ok(state
            .ads
            .values()
            .filter(|ad| {
                term.as_deref()
                    .is_none_or(|t| ad.name.to_ascii_lowercase().contains(t))
            })
            .count() as u64)
    }

    async fn get_aggregate(&self, ad_id: Uuid) -> Result<Option<Aggregate>> {
        Ok(self.state.lock().aggregates.get(&ad_id).cloned())
    }

    async fn log_click(&self, click: &Click) -> Result<()> {
        let mut state = self.state.lock();
        if !state.ads.contains_key(&click.ad_id) {
            return Err(AdMetricsError::not_found(format!(
                "Ad not found: {}",
                click.ad_id
            )));
        }
        if state.hot.contains_key(&click.id) || state.cold.contains_key(&click.id) {
            return Err(AdMetricsError::transaction_failed(format!(
                "记录点击失败: 重复的 id {}",
                click.id
            )));
        }

        // 先校验累计值行，保证失败时不留下孤立点击
        let aggregate = state.aggregates.get_mut(&click.ad_id).ok_or_else(|| {
            AdMetricsError::transaction_failed(format!(
                "aggregate row missing for ad {}",
                click.ad_id
            ))
        })?;
        aggregate.total_clicks += 1;
        aggregate.total_playback_time += i64::from(click.playback_time);
        aggregate.updated_at = click.created_at;

        state.hot.insert(click.id, click.clone());
        Ok(())
    }

    async fn archive_clicks_before(&self, cutoff: DateTime<Utc>, _batch_size: u64) -> Result<u64> {
        let mut state = self.state.lock();
        let expired: Vec<Uuid> = state
            .hot
            .values()
            .filter(|c| c.timestamp < cutoff)
            .map(|c| c.id)
            .collect();

        for id in &expired {
            if let Some(click) = state.hot.remove(id) {
                state.cold.insert(click.id, click);
            }
        }
        Ok(expired.len() as u64)
    }

    async fn ad_totals(&self, ad_id: Uuid, since: DateTime<Utc>) -> Result<AdTotals> {
        let state = self.state.lock();
        if !state.ads.contains_key(&ad_id) {
            return Err(AdMetricsError::not_found(format!("Ad not found: {}", ad_id)));
        }
        let aggregate = state.aggregates.get(&ad_id).ok_or_else(|| {
            AdMetricsError::transaction_failed(format!("aggregate row missing for ad {}", ad_id))
        })?;

        let hot = window_totals(state.hot.values(), Some(ad_id), since, None);
        let cold = window_totals(state.cold.values(), Some(ad_id), since, None);

        Ok(AdTotals {
            lifetime: Totals {
                clicks: aggregate.total_clicks,
                playback_time: aggregate.total_playback_time,
            },
            in_range: hot.merge(cold),
        })
    }

    async fn fleet_totals(&self, since: DateTime<Utc>) -> Result<FleetTotals> {
        let state = self.state.lock();

        let lifetime = state
            .aggregates
            .values()
            .fold(Totals::default(), |acc, a| Totals {
                clicks: acc.clicks + a.total_clicks,
                playback_time: acc.playback_time + a.total_playback_time,
            });

        let hot = window_totals(state.hot.values(), None, since, None);
        let cold = window_totals(state.cold.values(), None, since, None);

        let active: HashSet<Uuid> = state
            .hot
            .values()
            .chain(state.cold.values())
            .filter(|c| c.timestamp >= since)
            .map(|c| c.ad_id)
            .collect();

        Ok(FleetTotals {
            ad_count: state.ads.len() as u64,
            lifetime,
            in_range: hot.merge(cold),
            ads_in_range: active.len() as u64,
        })
    }

    async fn close_month(
        &self,
        ad_id: Uuid,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> Result<MonthlyAggregate> {
        let (start, end) = month_bounds(year, month)?;
        let mut state = self.state.lock();

        if !state.ads.contains_key(&ad_id) {
            return Err(AdMetricsError::not_found(format!("Ad not found: {}", ad_id)));
        }
        if let Some(existing) = state.monthly.get(&(ad_id, year, month)) {
            return Ok(existing.clone());
        }

        let totals = window_totals(state.hot.values(), Some(ad_id), start, Some(end)).merge(
            window_totals(state.cold.values(), Some(ad_id), start, Some(end)),
        );
        let sealed = MonthlyAggregate {
            id: Uuid::new_v4(),
            ad_id,
            month,
            year,
            total_clicks: totals.clicks,
            total_playback_time: totals.playback_time,
            created_at: now,
        };
        state.monthly.insert((ad_id, year, month), sealed.clone());
        Ok(sealed)
    }

    async fn list_monthly_aggregates(&self, ad_id: Uuid) -> Result<Vec<MonthlyAggregate>> {
        let state = self.state.lock();
        let mut rows: Vec<MonthlyAggregate> = state
            .monthly
            .values()
            .filter(|m| m.ad_id == ad_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.year, m.month));
        Ok(rows)
    }

    async fn click_partition_counts(&self, ad_id: Option<Uuid>) -> Result<ClickPartitionCounts> {
        let state = self.state.lock();
        let count = |clicks: &HashMap<Uuid, Click>| {
            clicks
                .values()
                .filter(|c| ad_id.is_none_or(|id| c.ad_id == id))
                .count() as u64
        };
        Ok(ClickPartitionCounts {
            hot: count(&state.hot),
            cold: count(&state.cold),
        })
    }
}
