//! 存储抽象
//!
//! 服务层只依赖 `AdRepository`，生产环境使用 `SeaOrmStorage`，测试使用 `MemoryStorage`。
//! 每个方法内部的多行读写都在同一个事务（或同一把锁）中完成。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::storage::models::{
    Ad, AdFilter, AdTotals, Aggregate, Click, ClickPartitionCounts, FleetTotals, MonthlyAggregate,
    PoolStats,
};

#[async_trait]
pub trait AdRepository: Send + Sync {
    /// 后端名称（sqlite / mysql / postgres / memory）
    fn backend_name(&self) -> &str;

    /// 连接池快照（无连接池的后端返回 None）
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }

    /// 存储连通性检查
    async fn ping(&self) -> Result<()>;

    // ============ Ad Registry ============

    /// 插入广告以及一行全零的累计值（同一事务）
    async fn create_ad(&self, ad: &Ad) -> Result<()>;

    async fn get_ad(&self, id: Uuid) -> Result<Option<Ad>>;

    async fn list_ads(&self, filter: &AdFilter) -> Result<Vec<Ad>>;

    /// 满足搜索条件的广告总数
    async fn count_ads(&self, search: Option<&str>) -> Result<u64>;

    async fn get_aggregate(&self, ad_id: Uuid) -> Result<Option<Aggregate>>;

    // ============ Ingestion ============

    /// 写入热分区并原子递增累计值（同一事务）
    ///
    /// 广告不存在返回 `NotFound`；累计值行缺失返回 `TransactionFailed`。
    async fn log_click(&self, click: &Click) -> Result<()>;

    // ============ Archival ============

    /// 把 `timestamp < cutoff` 的热分区点击移入冷分区，返回移动行数
    async fn archive_clicks_before(&self, cutoff: DateTime<Utc>, batch_size: u64) -> Result<u64>;

    // ============ Analytics ============

    /// 单广告累计值 + `timestamp >= since` 的冷热分区窗口值
    async fn ad_totals(&self, ad_id: Uuid, since: DateTime<Utc>) -> Result<AdTotals>;

    /// 全部广告累计值 + 冷热分区窗口值
    async fn fleet_totals(&self, since: DateTime<Utc>) -> Result<FleetTotals>;

    // ============ Monthly aggregates ============

    /// 封存一个自然月的汇总；已存在时原样返回
    async fn close_month(
        &self,
        ad_id: Uuid,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> Result<MonthlyAggregate>;

    /// 按 (year, month) 升序返回
    async fn list_monthly_aggregates(&self, ad_id: Uuid) -> Result<Vec<MonthlyAggregate>>;

    // ============ Inspection ============

    async fn click_partition_counts(&self, ad_id: Option<Uuid>) -> Result<ClickPartitionCounts>;
}
