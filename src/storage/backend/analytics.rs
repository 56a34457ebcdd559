//! Windowed analytics for SeaOrmStorage
//!
//! 累计值与冷热分区窗口值在同一个只读快照中读取，归档并发执行时不会出现重复或遗漏。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use uuid::Uuid;

use super::SeaOrmStorage;
use super::clicks::AGGREGATE_MISSING;
use super::partition::{
    TotalsRow, distinct_ads_since, partition_count, partition_totals, sum_as_bigint,
};
use super::retry;
use crate::errors::{AdMetricsError, Result};
use crate::storage::models::{AdTotals, ClickPartitionCounts, FleetTotals, Totals};

use migration::entities::{ad, aggregated_analytics, archived_click, click};

impl SeaOrmStorage {
    pub(super) async fn read_ad_totals(&self, ad_id: Uuid, since: DateTime<Utc>) -> Result<AdTotals> {
        retry::with_retry(
            &format!("ad_totals({})", ad_id),
            self.retry_config,
            || self.ad_totals_txn(ad_id, since),
        )
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("读取广告统计失败"))
    }

    async fn ad_totals_txn(
        &self,
        ad_id: Uuid,
        since: DateTime<Utc>,
    ) -> std::result::Result<AdTotals, DbErr> {
        let txn = self.begin_snapshot().await?;

        let aggregate = aggregated_analytics::Entity::find()
            .filter(aggregated_analytics::Column::AdId.eq(ad_id))
            .one(&txn)
            .await?;

        let lifetime = match aggregate {
            Some(row) => Totals {
                clicks: row.total_clicks,
                playback_time: row.total_playback_time,
            },
            None => {
                let exists = ad::Entity::find_by_id(ad_id).one(&txn).await?.is_some();
                return Err(if exists {
                    DbErr::Custom(format!("{} {}", AGGREGATE_MISSING, ad_id))
                } else {
                    DbErr::RecordNotFound(format!("Ad not found: {}", ad_id))
                });
            }
        };

        let hot = partition_totals::<click::Entity, _>(&txn, Some(ad_id), since, None).await?;
        let cold =
            partition_totals::<archived_click::Entity, _>(&txn, Some(ad_id), since, None).await?;

        txn.commit().await?;
        Ok(AdTotals {
            lifetime,
            in_range: hot.merge(cold),
        })
    }

    pub(super) async fn read_fleet_totals(&self, since: DateTime<Utc>) -> Result<FleetTotals> {
        retry::with_retry("fleet_totals", self.retry_config, || {
            self.fleet_totals_txn(since)
        })
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("读取全局统计失败"))
    }

    async fn fleet_totals_txn(
        &self,
        since: DateTime<Utc>,
    ) -> std::result::Result<FleetTotals, DbErr> {
        let txn = self.begin_snapshot().await?;
        let backend = self.db.get_database_backend();

        let ad_count = ad::Entity::find().count(&txn).await?;

        let lifetime = aggregated_analytics::Entity::find()
            .select_only()
            .column_as(
                sum_as_bigint(aggregated_analytics::Column::TotalClicks, backend),
                "clicks",
            )
            .column_as(
                sum_as_bigint(aggregated_analytics::Column::TotalPlaybackTime, backend),
                "playback_time",
            )
            .into_model::<TotalsRow>()
            .one(&txn)
            .await?
            .map(Totals::from)
            .unwrap_or_default();

        let hot = partition_totals::<click::Entity, _>(&txn, None, since, None).await?;
        let cold = partition_totals::<archived_click::Entity, _>(&txn, None, since, None).await?;

        let mut active = HashSet::new();
        distinct_ads_since::<click::Entity, _>(&txn, since, &mut active).await?;
        distinct_ads_since::<archived_click::Entity, _>(&txn, since, &mut active).await?;

        txn.commit().await?;
        Ok(FleetTotals {
            ad_count,
            lifetime,
            in_range: hot.merge(cold),
            ads_in_range: active.len() as u64,
        })
    }

    pub(super) async fn read_partition_counts(
        &self,
        ad_id: Option<Uuid>,
    ) -> Result<ClickPartitionCounts> {
        retry::with_retry("click_partition_counts", self.retry_config, || async {
            let txn = self.begin_snapshot().await?;
            let hot = partition_count::<click::Entity, _>(&txn, ad_id).await?;
            let cold = partition_count::<archived_click::Entity, _>(&txn, ad_id).await?;
            txn.commit().await?;
            Ok(ClickPartitionCounts { hot, cold })
        })
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("统计分区行数失败"))
    }
}
