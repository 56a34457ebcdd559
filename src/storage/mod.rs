use std::sync::Arc;

use tracing::info;

use crate::errors::Result;

pub mod backend;
pub mod memory;
pub mod models;
pub mod repository;

pub use backend::SeaOrmStorage;
pub use memory::MemoryStorage;
pub use models::{
    Ad, AdFilter, AdTotals, Aggregate, Click, ClickPartitionCounts, FleetTotals, MonthlyAggregate,
    PoolStats, SortOrder, Totals,
};
pub use repository::AdRepository;

pub struct StorageFactory;

impl StorageFactory {
    /// 根据全局配置中的数据库 URL 创建存储
    pub async fn create() -> Result<Arc<dyn AdRepository>> {
        let config = crate::config::get_config();
        let database_url = &config.database.database_url;

        if database_url.starts_with("memory://") {
            info!("Using in-memory storage");
            return Ok(Arc::new(MemoryStorage::new()));
        }

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage =
            backend::SeaOrmStorage::new(database_url, &backend_type, &config.database)
                .await?;
        Ok(Arc::new(storage))
    }
}
