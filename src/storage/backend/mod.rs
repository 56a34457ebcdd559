//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod ads;
mod analytics;
mod archive;
mod clicks;
mod connection;
mod converters;
mod monthly;
mod partition;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::sync::Cache;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, DbErr, IsolationLevel, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::errors::{AdMetricsError, Result};
use crate::storage::models::{
    Ad, AdFilter, AdTotals, Aggregate, Click, ClickPartitionCounts, FleetTotals, MonthlyAggregate,
    PoolStats,
};
use crate::storage::repository::AdRepository;

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(AdMetricsError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 规范化 backend 名称
pub fn normalize_backend_name(backend: &str) -> String {
    match backend {
        "mariadb" => "mysql".to_string(),
        other => other.to_string(),
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 分页 COUNT 缓存（TTL 30秒）
    count_cache: Cache<String, u64>,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(
        database_url: &str,
        backend_name: &str,
        config: &DatabaseConfig,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(AdMetricsError::database_config(
                "DATABASE_URL 未设置".to_string(),
            ));
        }

        let backend_name = normalize_backend_name(backend_name);

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, config).await?
        } else {
            connect_generic(database_url, &backend_name, config).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name,
            count_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(100)
                .build(),
            retry_config: retry::RetryConfig::from(config),
        };

        // 运行迁移
        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 清除分页 COUNT 缓存（数据变更时调用）
    pub fn invalidate_count_cache(&self) {
        self.count_cache.invalidate_all();
    }

    fn is_sqlite(&self) -> bool {
        self.backend_name == "sqlite"
    }

    /// 只读快照事务
    ///
    /// SQLite (WAL) 的读事务从第一次读取开始即为一致快照，其他后端显式使用 REPEATABLE READ。
    async fn begin_snapshot(&self) -> std::result::Result<DatabaseTransaction, DbErr> {
        if self.is_sqlite() {
            self.db.begin().await
        } else {
            self.db
                .begin_with_config(
                    Some(IsolationLevel::RepeatableRead),
                    Some(AccessMode::ReadOnly),
                )
                .await
        }
    }
}

#[async_trait]
impl AdRepository for SeaOrmStorage {
    fn backend_name(&self) -> &str {
        &self.backend_name
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        let (size, idle) = match self.backend_name.as_str() {
            "sqlite" => {
                let pool = self.db.get_sqlite_connection_pool();
                (pool.size(), pool.num_idle())
            }
            "postgres" => {
                let pool = self.db.get_postgres_connection_pool();
                (pool.size(), pool.num_idle())
            }
            "mysql" => {
                let pool = self.db.get_mysql_connection_pool();
                (pool.size(), pool.num_idle())
            }
            _ => return None,
        };
        Some(PoolStats {
            size,
            idle: u32::try_from(idle).unwrap_or(u32::MAX),
        })
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| AdMetricsError::storage_unavailable(format!("数据库不可用: {}", e)))
    }

    async fn create_ad(&self, ad: &Ad) -> Result<()> {
        self.insert_ad(ad).await
    }

    async fn get_ad(&self, id: Uuid) -> Result<Option<Ad>> {
        self.find_ad(id).await
    }

    async fn list_ads(&self, filter: &AdFilter) -> Result<Vec<Ad>> {
        self.query_ads(filter).await
    }

    async fn count_ads(&self, search: Option<&str>) -> Result<u64> {
        self.count_ads_cached(search).await
    }

    async fn get_aggregate(&self, ad_id: Uuid) -> Result<Option<Aggregate>> {
        self.find_aggregate(ad_id).await
    }

    async fn log_click(&self, click: &Click) -> Result<()> {
        self.insert_click(click).await
    }

    async fn archive_clicks_before(&self, cutoff: DateTime<Utc>, batch_size: u64) -> Result<u64> {
        self.move_to_cold(cutoff, batch_size).await
    }

    async fn ad_totals(&self, ad_id: Uuid, since: DateTime<Utc>) -> Result<AdTotals> {
        self.read_ad_totals(ad_id, since).await
    }

    async fn fleet_totals(&self, since: DateTime<Utc>) -> Result<FleetTotals> {
        self.read_fleet_totals(since).await
    }

    async fn close_month(
        &self,
        ad_id: Uuid,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> Result<MonthlyAggregate> {
        self.seal_month(ad_id, year, month, now).await
    }

    async fn list_monthly_aggregates(&self, ad_id: Uuid) -> Result<Vec<MonthlyAggregate>> {
        self.query_monthly(ad_id).await
    }

    async fn click_partition_counts(&self, ad_id: Option<Uuid>) -> Result<ClickPartitionCounts> {
        self.read_partition_counts(ad_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://ads.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("ads.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mariadb://u:p@localhost/ads").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgresql://localhost/ads").unwrap(),
            "postgres"
        );
        assert!(matches!(
            infer_backend_from_url("redis://localhost"),
            Err(AdMetricsError::DatabaseConfig(_))
        ));
    }

    #[test]
    fn test_normalize_backend_name() {
        assert_eq!(normalize_backend_name("mariadb"), "mysql");
        assert_eq!(normalize_backend_name("postgres"), "postgres");
    }
}
