//! 冷热分区的通用查询
//!
//! `clicks` 与 `archived_clicks` 结构相同，窗口统计对两张表执行同一条查询。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QuerySelect,
};
use uuid::Uuid;

use crate::storage::models::Totals;
use migration::entities::{archived_click, click};

/// 点击分区表的列描述
pub(super) trait ClickPartition: EntityTrait {
    fn id_column() -> Self::Column;
    fn ad_id_column() -> Self::Column;
    fn timestamp_column() -> Self::Column;
    fn playback_time_column() -> Self::Column;
}

impl ClickPartition for click::Entity {
    fn id_column() -> Self::Column {
        click::Column::Id
    }
    fn ad_id_column() -> Self::Column {
        click::Column::AdId
    }
    fn timestamp_column() -> Self::Column {
        click::Column::Timestamp
    }
    fn playback_time_column() -> Self::Column {
        click::Column::PlaybackTime
    }
}

impl ClickPartition for archived_click::Entity {
    fn id_column() -> Self::Column {
        archived_click::Column::Id
    }
    fn ad_id_column() -> Self::Column {
        archived_click::Column::AdId
    }
    fn timestamp_column() -> Self::Column {
        archived_click::Column::Timestamp
    }
    fn playback_time_column() -> Self::Column {
        archived_click::Column::PlaybackTime
    }
}

/// COUNT / SUM 聚合结果行
#[derive(Debug, FromQueryResult)]
pub(super) struct TotalsRow {
    pub clicks: Option<i64>,
    pub playback_time: Option<i64>,
}

impl From<TotalsRow> for Totals {
    fn from(row: TotalsRow) -> Self {
        Totals {
            clicks: row.clicks.unwrap_or(0),
            playback_time: row.playback_time.unwrap_or(0),
        }
    }
}

/// SUM 在 PostgreSQL 上返回 NUMERIC、在 MySQL 上返回 DECIMAL，统一转为 64 位整数
pub(super) fn sum_as_bigint<C: ColumnTrait>(column: C, backend: DbBackend) -> Expr {
    match backend {
        DbBackend::Postgres => Func::cast_as(column.sum(), Alias::new("BIGINT")).into(),
        DbBackend::MySql => Func::cast_as(column.sum(), Alias::new("SIGNED")).into(),
        _ => column.sum(),
    }
}

/// 时间区间 [from, until) 内的点击数与播放时长之和
pub(super) async fn partition_totals<E, C>(
    conn: &C,
    ad_id: Option<Uuid>,
    from: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> Result<Totals, DbErr>
where
    E: ClickPartition,
    C: ConnectionTrait,
{
    let backend = conn.get_database_backend();

    let mut query = E::find()
        .select_only()
        .column_as(E::id_column().count(), "clicks")
        .column_as(sum_as_bigint(E::playback_time_column(), backend), "playback_time")
        .filter(E::timestamp_column().gte(from));

    if let Some(until) = until {
        query = query.filter(E::timestamp_column().lt(until));
    }
    if let Some(ad_id) = ad_id {
        query = query.filter(E::ad_id_column().eq(ad_id));
    }

    let row = query.into_model::<TotalsRow>().one(conn).await?;
    Ok(row.map(Totals::from).unwrap_or_default())
}

/// 窗口内出现过点击的广告 id
pub(super) async fn distinct_ads_since<E, C>(
    conn: &C,
    from: DateTime<Utc>,
    into: &mut HashSet<Uuid>,
) -> Result<(), DbErr>
where
    E: ClickPartition,
    C: ConnectionTrait,
{
    let ids: Vec<Uuid> = E::find()
        .select_only()
        .column(E::ad_id_column())
        .distinct()
        .filter(E::timestamp_column().gte(from))
        .into_tuple()
        .all(conn)
        .await?;
    into.extend(ids);
    Ok(())
}

/// 分区行数（可按广告过滤）
pub(super) async fn partition_count<E, C>(conn: &C, ad_id: Option<Uuid>) -> Result<u64, DbErr>
where
    E: ClickPartition,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let mut query = E::find();
    if let Some(ad_id) = ad_id {
        query = query.filter(E::ad_id_column().eq(ad_id));
    }
    query.count(conn).await
}
