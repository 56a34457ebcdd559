//! Ad registry operations for SeaOrmStorage

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, DbErr, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::SeaOrmStorage;
use super::converters::{ad_to_active_model, model_to_ad, model_to_aggregate, zero_aggregate_for};
use super::retry;
use crate::errors::{AdMetricsError, Result};
use crate::storage::models::{Ad, AdFilter, Aggregate, SortOrder};

use migration::entities::{ad, aggregated_analytics};

const LIKE_ESCAPE: char = '\\';

/// 转义 LIKE 通配符，搜索词按字面匹配
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// 名称的大小写不敏感子串匹配
fn search_condition(term: Option<&str>) -> Condition {
    let mut condition = Condition::all();
    if let Some(term) = term {
        let pattern = LikeExpr::new(format!("%{}%", escape_like(term))).escape(LIKE_ESCAPE);
        condition =
            condition.add(Expr::expr(Func::lower(Expr::col(ad::Column::Name))).like(pattern));
    }
    condition
}

impl SeaOrmStorage {
    pub(super) async fn insert_ad(&self, new_ad: &Ad) -> Result<()> {
        let db = &self.db;

        retry::with_retry(
            &format!("create_ad({})", new_ad.id),
            self.retry_config,
            || async {
                let txn = db.begin().await?;
                ad::Entity::insert(ad_to_active_model(new_ad))
                    .exec_without_returning(&txn)
                    .await?;
                aggregated_analytics::Entity::insert(zero_aggregate_for(new_ad))
                    .exec_without_returning(&txn)
                    .await?;
                txn.commit().await
            },
        )
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("创建广告失败"))?;

        self.invalidate_count_cache();
        info!("Ad created: {} ({})", new_ad.id, new_ad.name);
        Ok(())
    }

    pub(super) async fn find_ad(&self, id: Uuid) -> Result<Option<Ad>> {
        let db = &self.db;

        let model = retry::with_retry(&format!("get_ad({})", id), self.retry_config, || async {
            ad::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("查询广告失败"))?;

        Ok(model.map(model_to_ad))
    }

    pub(super) async fn query_ads(&self, filter: &AdFilter) -> Result<Vec<Ad>> {
        let db = &self.db;
        let term = filter.search_term();

        let models = retry::with_retry("list_ads", self.retry_config, || async {
            let query = ad::Entity::find().filter(search_condition(term.as_deref()));
            let query = match filter.order {
                SortOrder::Asc => query
                    .order_by_asc(ad::Column::CreatedAt)
                    .order_by_asc(ad::Column::Id),
                SortOrder::Desc => query
                    .order_by_desc(ad::Column::CreatedAt)
                    .order_by_desc(ad::Column::Id),
            };
            query
                .offset(filter.offset())
                .limit(filter.rows)
                .all(db)
                .await
        })
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("查询广告列表失败"))?;

        Ok(models.into_iter().map(model_to_ad).collect())
    }

    /// 带 30 秒缓存的 COUNT
    pub(super) async fn count_ads_cached(&self, search: Option<&str>) -> Result<u64> {
        let term = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let cache_key = format!("count:s={:?}", term);

        if let Some(count) = self.count_cache.get(&cache_key) {
            debug!("COUNT cache hit: {}", cache_key);
            return Ok(count);
        }

        let db = &self.db;
        let count = retry::with_retry("count_ads", self.retry_config, || async {
            ad::Entity::find()
                .filter(search_condition(term.as_deref()))
                .count(db)
                .await
        })
        .await
        .map_err(|e| AdMetricsError::from(e).with_context("统计广告数量失败"))?;

        self.count_cache.insert(cache_key, count);
        Ok(count)
    }

    pub(super) async fn find_aggregate(&self, ad_id: Uuid) -> Result<Option<Aggregate>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("get_aggregate({})", ad_id),
            self.retry_config,
            || async {
                aggregated_analytics::Entity::find()
                    .filter(aggregated_analytics::Column::AdId.eq(ad_id))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e: DbErr| AdMetricsError::from(e).with_context("查询累计值失败"))?;

        Ok(model.map(model_to_aggregate))
    }
}
