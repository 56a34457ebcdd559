//! Click ingestion for SeaOrmStorage
//!
//! 热分区插入与累计值递增在同一事务内完成，失败时整体回滚，重试时整体重放。

use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, ExprTrait, QueryFilter, QuerySelect, TransactionTrait,
    sea_query::Expr,
};
use tracing::{debug, error};

use super::SeaOrmStorage;
use super::converters::click_to_active_model;
use super::retry;
use crate::errors::{AdMetricsError, Result};
use crate::storage::models::Click;

use migration::entities::{ad, aggregated_analytics, click};

/// 累计值行缺失时的错误前缀
pub(super) const AGGREGATE_MISSING: &str = "aggregate row missing for ad";

impl SeaOrmStorage {
    pub(super) async fn insert_click(&self, event: &Click) -> Result<()> {
        let result = retry::with_retry(
            &format!("log_click({})", event.id),
            self.retry_config,
            || self.log_click_txn(event),
        )
        .await;

        match result {
            Ok(()) => {
                debug!("Click {} logged for ad {}", event.id, event.ad_id);
                Ok(())
            }
            Err(DbErr::Custom(msg)) if msg.starts_with(AGGREGATE_MISSING) => {
                error!("{}", msg);
                Err(AdMetricsError::transaction_failed(msg))
            }
            Err(e) => Err(AdMetricsError::from(e).with_context("记录点击失败")),
        }
    }

    async fn log_click_txn(&self, event: &Click) -> std::result::Result<(), DbErr> {
        let txn = self.db.begin().await?;

        // 共享锁保证广告在事务提交前不会被删除
        let mut ad_query = ad::Entity::find_by_id(event.ad_id);
        if !self.is_sqlite() {
            ad_query = ad_query.lock_shared();
        }
        if ad_query.one(&txn).await?.is_none() {
            return Err(DbErr::RecordNotFound(format!(
                "Ad not found: {}",
                event.ad_id
            )));
        }

        click::Entity::insert(click_to_active_model(event))
            .exec_without_returning(&txn)
            .await?;

        let playback = i64::from(event.playback_time);
        let updated = aggregated_analytics::Entity::update_many()
            .col_expr(
                aggregated_analytics::Column::TotalClicks,
                Expr::col(aggregated_analytics::Column::TotalClicks).add(1i64),
            )
            .col_expr(
                aggregated_analytics::Column::TotalPlaybackTime,
                Expr::col(aggregated_analytics::Column::TotalPlaybackTime).add(playback),
            )
            .col_expr(
                aggregated_analytics::Column::UpdatedAt,
                Expr::value(event.created_at),
            )
            .filter(aggregated_analytics::Column::AdId.eq(event.ad_id))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            return Err(DbErr::Custom(format!(
                "{} {}",
                AGGREGATE_MISSING, event.ad_id
            )));
        }

        txn.commit().await
    }
}
