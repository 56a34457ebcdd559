//! Monthly close for SeaOrmStorage

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::SeaOrmStorage;
use super::converters::{model_to_monthly, monthly_to_active_model};
use super::partition::partition_totals;
use super::retry;
use crate::errors::{AdMetricsError, Result};
use crate::storage::models::{MonthlyAggregate, month_bounds};

use migration::entities::{ad, archived_click, click, monthly_analytics};

impl SeaOrmStorage {
    pub(super) async fn seal_month(
        &self,
        ad_id: Uuid,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> Result<MonthlyAggregate> {
        let bounds = month_bounds(year, month)?;

        let result = retry::with_retry(
            &format!("close_month({}, {}-{:02})", ad_id, year, month),
            self.retry_config,
            || self.close_month_txn(ad_id, year, month, bounds, now),
        )
        .await;

        match result {
            Ok(sealed) => Ok(sealed),
            // 并发封存同一个月时唯一索引冲突，以先提交的一方为准
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                self.find_monthly(ad_id, year, month).await?.ok_or_else(|| {
                    AdMetricsError::transaction_failed(format!(
                        "封存月度汇总失败: {}-{:02} 冲突后未找到已有记录",
                        year, month
                    ))
                })
            }
            Err(e) => Err(AdMetricsError::from(e).with_context("封存月度汇总失败")),
        }
    }

    async fn find_monthly(
        &self,
        ad_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Option<MonthlyAggregate>> {
        let model = monthly_analytics::Entity::find()
            .filter(monthly_analytics::Column::AdId.eq(ad_id))
            .filter(monthly_analytics::Column::Year.eq(year))
            .filter(monthly_analytics::Column::Month.eq(month as i32))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_monthly))
    }

    async fn close_month_txn(
        &self,
        ad_id: Uuid,
        year: i32,
        month: u32,
        (start, end): (DateTime<Utc>, DateTime<Utc>),
        now: DateTime<Utc>,
    ) -> std::result::Result<MonthlyAggregate, DbErr> {
        let txn = self.db.begin().await?;

        let mut ad_query = ad::Entity::find_by_id(ad_id);
        if !self.is_sqlite() {
            ad_query = ad_query.lock_shared();
        }
        if ad_query.one(&txn).await?.is_none() {
            return Err(DbErr::RecordNotFound(format!("Ad not found: {}", ad_id)));
        }

        let existing = monthly_analytics::Entity::find()
            .filter(monthly_analytics::Column::AdId.eq(ad_id))
            .filter(monthly_analytics::Column::Year.eq(year))
            .filter(monthly_analytics::Column::Month.eq(month as i32))
            .one(&txn)
            .await?;
        if let Some(model) = existing {
            txn.commit().await?;
            return Ok(model_to_monthly(model));
        }

        let hot = partition_totals::<click::Entity, _>(&txn, Some(ad_id), start, Some(end)).await?;
        let cold =
            partition_totals::<archived_click::Entity, _>(&txn, Some(ad_id), start, Some(end))
                .await?;
        let totals = hot.merge(cold);

        let sealed = MonthlyAggregate {
            id: Uuid::new_v4(),
            ad_id,
            month,
            year,
            total_clicks: totals.clicks,
            total_playback_time: totals.playback_time,
            created_at: now,
        };
        monthly_analytics::Entity::insert(monthly_to_active_model(&sealed))
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;
        info!(
            "Month {}-{:02} closed for ad {}: {} clicks",
            year, month, ad_id, sealed.total_clicks
        );
        Ok(sealed)
    }

    pub(super) async fn query_monthly(&self, ad_id: Uuid) -> Result<Vec<MonthlyAggregate>> {
        let db = &self.db;

        let models = retry::with_retry(
            &format!("list_monthly({})", ad_id),
            self.retry_config,
            || async {
                monthly_analytics::Entity::find()
                    .filter(monthly_analytics::Column::AdId.eq(ad_id))
                    .order_by_asc(monthly_analytics::Column::Year)
                    .order_by_asc(monthly_analytics::Column::Month)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("查询月度汇总失败"))?;

        Ok(models.into_iter().map(model_to_monthly).collect())
    }
}
