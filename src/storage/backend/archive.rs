//! Hot → cold archival for SeaOrmStorage

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::SeaOrmStorage;
use super::retry;
use crate::errors::{AdMetricsError, Result};

use migration::entities::{archived_click, click};

const DEFAULT_BATCH_SIZE: u64 = 1000;

impl SeaOrmStorage {
    pub(super) async fn move_to_cold(&self, cutoff: DateTime<Utc>, batch_size: u64) -> Result<u64> {
        let batch_size = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };

        let moved = retry::with_retry("archive_clicks", self.retry_config, || {
            self.archive_txn(cutoff, batch_size)
        })
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("归档点击失败"))?;

        info!("Archived {} clicks older than {}", moved, cutoff.to_rfc3339());
        Ok(moved)
    }

    /// 整个搬迁在一个事务内完成：要么全部移动，要么一行不动
    async fn archive_txn(&self, cutoff: DateTime<Utc>, batch_size: u64) -> std::result::Result<u64, DbErr> {
        let txn = self.db.begin().await?;
        let mut total = 0u64;

        loop {
            let mut query = click::Entity::find()
                .filter(click::Column::Timestamp.lt(cutoff))
                .order_by_asc(click::Column::Id)
                .limit(batch_size);
            if !self.is_sqlite() {
                query = query.lock_exclusive();
            }

            let batch = query.all(&txn).await?;
            if batch.is_empty() {
                break;
            }

            let fetched = batch.len() as u64;
            let ids: Vec<Uuid> = batch.iter().map(|m| m.id).collect();

            archived_click::Entity::insert_many(
                batch.into_iter().map(archived_click::ActiveModel::from),
            )
            .exec_without_returning(&txn)
            .await?;

            let deleted = click::Entity::delete_many()
                .filter(click::Column::Id.is_in(ids))
                .exec(&txn)
                .await?
                .rows_affected;

            if deleted != fetched {
                return Err(DbErr::Custom(format!(
                    "archive batch mismatch: copied {} rows, deleted {}",
                    fetched, deleted
                )));
            }

            total += fetched;
            debug!("Archive batch moved {} clicks", fetched);

            if fetched < batch_size {
                break;
            }
        }

        txn.commit().await?;
        Ok(total)
    }
}
