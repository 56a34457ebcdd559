//! Storage backend tests
//!
//! Tests for SeaOrmStorage using temporary SQLite databases.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tempfile::TempDir;
use uuid::Uuid;

use admetrics::config::DatabaseConfig;
use admetrics::errors::AdMetricsError;
use admetrics::storage::backend::{SeaOrmStorage, connect_sqlite, run_migrations};
use admetrics::storage::{Ad, AdFilter, AdRepository, Click, MemoryStorage, SortOrder};
use migration::entities::{aggregated_analytics, archived_click};

/// 创建测试用的广告
fn create_test_ad(name: &str) -> Ad {
    Ad {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("{} description", name),
        image_url: format!("https://cdn.example.com/{}.png", name),
        target_url: "https://example.com/landing".to_string(),
        created_at: Utc::now(),
    }
}

/// 创建指定时间点的点击
fn create_test_click(ad_id: Uuid, timestamp: chrono::DateTime<Utc>, playback: u32) -> Click {
    Click {
        id: Uuid::new_v4(),
        ad_id,
        timestamp,
        ip_address: "203.0.113.7".to_string(),
        playback_time: playback,
        created_at: Utc::now(),
    }
}

/// 创建临时 SQLite 数据库的存储实例
async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    create_temp_storage_with(DatabaseConfig::default()).await
}

async fn create_temp_storage_with(config: DatabaseConfig) -> (SeaOrmStorage, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite", &config)
        .await
        .expect("Failed to create storage");

    (storage, temp_dir)
}

// =============================================================================
// 连接测试
// =============================================================================

#[cfg(test)]
mod connection_tests {
    use super::*;

    #[tokio::test]
    async fn test_run_migrations_twice() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("migration_test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let conn = connect_sqlite(&db_url, &DatabaseConfig::default())
            .await
            .unwrap();
        run_migrations(&conn).await.expect("first run");
        run_migrations(&conn).await.expect("second run is a no-op");
    }

    #[tokio::test]
    async fn test_storage_new_empty_url_fails() {
        let result = SeaOrmStorage::new("", "sqlite", &DatabaseConfig::default()).await;
        assert!(matches!(result, Err(AdMetricsError::DatabaseConfig(_))));
    }

    #[tokio::test]
    async fn test_ping_and_backend_name() {
        let (storage, _temp) = create_temp_storage().await;
        storage.ping().await.unwrap();
        assert_eq!(storage.backend_name(), "sqlite");
        let stats = storage.pool_stats().expect("sqlite pool stats");
        assert!(stats.size >= 1);
        assert!(stats.in_use() <= stats.size);
    }
}

// =============================================================================
// 广告注册
// =============================================================================

#[cfg(test)]
mod ad_registry_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_ad_with_zero_aggregate() {
        let (storage, _temp) = create_temp_storage().await;

        let ad = create_test_ad("launch");
        storage.create_ad(&ad).await.unwrap();

        let stored = storage.get_ad(ad.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "launch");
        assert_eq!(stored.target_url, ad.target_url);

        let aggregate = storage.get_aggregate(ad.id).await.unwrap().unwrap();
        assert_eq!(aggregate.ad_id, ad.id);
        assert_eq!(aggregate.total_clicks, 0);
        assert_eq!(aggregate.total_playback_time, 0);
    }

    #[tokio::test]
    async fn test_get_missing_ad_returns_none() {
        let (storage, _temp) = create_temp_storage().await;
        assert!(storage.get_ad(Uuid::new_v4()).await.unwrap().is_none());
        assert!(storage.get_aggregate(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_search_sort_and_paginate() {
        let (storage, _temp) = create_temp_storage().await;

        let base = Utc::now() - Duration::hours(1);
        for (i, name) in ["Summer Sale", "winter sale", "Brand Film"].iter().enumerate() {
            let mut ad = create_test_ad(name);
            ad.created_at = base + Duration::minutes(i as i64);
            storage.create_ad(&ad).await.unwrap();
        }

        let filter = AdFilter {
            search: Some("SALE".to_string()),
            order: SortOrder::Asc,
            page: 1,
            rows: 10,
        };
        let names: Vec<String> = storage
            .list_ads(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Summer Sale", "winter sale"]);
        assert_eq!(storage.count_ads(Some("sale")).await.unwrap(), 2);
        assert_eq!(storage.count_ads(None).await.unwrap(), 3);

        let second_page = AdFilter {
            search: None,
            order: SortOrder::Desc,
            page: 2,
            rows: 2,
        };
        let page = storage.list_ads(&second_page).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Summer Sale");
    }

    #[tokio::test]
    async fn test_count_cache_invalidated_on_create() {
        let (storage, _temp) = create_temp_storage().await;

        assert_eq!(storage.count_ads(None).await.unwrap(), 0);
        storage.create_ad(&create_test_ad("first")).await.unwrap();
        assert_eq!(storage.count_ads(None).await.unwrap(), 1);
    }

    /// 通配符按字面匹配，非 ASCII 字母不折叠大小写
    async fn assert_literal_search(storage: &dyn AdRepository) {
        for name in ["50% off", "500 off", "a_b", "axb", "ÉTÉ promo"] {
            storage.create_ad(&create_test_ad(name)).await.unwrap();
        }

        let names = |ads: Vec<Ad>| {
            let mut names: Vec<String> = ads.into_iter().map(|ad| ad.name).collect();
            names.sort();
            names
        };
        let search = |term: &str| AdFilter {
            search: Some(term.to_string()),
            ..AdFilter::default()
        };

        let found = storage.list_ads(&search("50%")).await.unwrap();
        assert_eq!(names(found), vec!["50% off".to_string()]);
        assert_eq!(storage.count_ads(Some("50%")).await.unwrap(), 1);

        let found = storage.list_ads(&search("A_B")).await.unwrap();
        assert_eq!(names(found), vec!["a_b".to_string()]);

        assert_eq!(storage.count_ads(Some("été")).await.unwrap(), 0);
        assert_eq!(storage.count_ads(Some("ÉTÉ PROMO")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_is_literal_on_sqlite() {
        let (storage, _temp) = create_temp_storage().await;
        assert_literal_search(&storage).await;
    }

    #[tokio::test]
    async fn test_search_is_literal_in_memory() {
        assert_literal_search(&MemoryStorage::new()).await;
    }
}

// =============================================================================
// 点击写入
// =============================================================================

#[cfg(test)]
mod ingestion_tests {
    use super::*;

    #[tokio::test]
    async fn test_log_click_increments_aggregate() {
        let (storage, _temp) = create_temp_storage().await;
        let ad = create_test_ad("counter");
        storage.create_ad(&ad).await.unwrap();

        for playback in [10, 20, 30] {
            storage
                .log_click(&create_test_click(ad.id, Utc::now(), playback))
                .await
                .unwrap();
        }

        let aggregate = storage.get_aggregate(ad.id).await.unwrap().unwrap();
        assert_eq!(aggregate.total_clicks, 3);
        assert_eq!(aggregate.total_playback_time, 60);
        assert!(aggregate.updated_at >= aggregate.created_at);

        let counts = storage.click_partition_counts(Some(ad.id)).await.unwrap();
        assert_eq!(counts.hot, 3);
        assert_eq!(counts.cold, 0);
    }

    #[tokio::test]
    async fn test_unknown_ad_leaves_no_rows() {
        let (storage, _temp) = create_temp_storage().await;
        let ad = create_test_ad("bystander");
        storage.create_ad(&ad).await.unwrap();

        let result = storage
            .log_click(&create_test_click(Uuid::new_v4(), Utc::now(), 5))
            .await;
        assert!(matches!(result, Err(AdMetricsError::NotFound(_))));

        let counts = storage.click_partition_counts(None).await.unwrap();
        assert_eq!(counts.total(), 0);
        let aggregate = storage.get_aggregate(ad.id).await.unwrap().unwrap();
        assert_eq!(aggregate.total_clicks, 0);
    }

    #[tokio::test]
    async fn test_missing_aggregate_rolls_back_click() {
        let (storage, _temp) = create_temp_storage().await;
        let ad = create_test_ad("broken");
        storage.create_ad(&ad).await.unwrap();

        aggregated_analytics::Entity::delete_many()
            .filter(aggregated_analytics::Column::AdId.eq(ad.id))
            .exec(storage.get_db())
            .await
            .unwrap();

        let result = storage
            .log_click(&create_test_click(ad.id, Utc::now(), 5))
            .await;
        assert!(matches!(result, Err(AdMetricsError::TransactionFailed(_))));

        let counts = storage.click_partition_counts(Some(ad.id)).await.unwrap();
        assert_eq!(counts.hot, 0);
    }

    #[tokio::test]
    async fn test_concurrent_ingestion_across_ads() {
        let config = DatabaseConfig {
            retry_count: 10,
            retry_base_delay_ms: 10,
            max_open_conns: 4,
            ..DatabaseConfig::default()
        };
        let (storage, _temp) = create_temp_storage_with(config).await;
        let storage = Arc::new(storage);

        let ads: Vec<Ad> = (0..3).map(|i| create_test_ad(&format!("ad-{}", i))).collect();
        for ad in &ads {
            storage.create_ad(ad).await.unwrap();
        }

        let mut handles = Vec::new();
        for (i, ad) in ads.iter().enumerate() {
            for n in 0..8u32 {
                let storage = storage.clone();
                let ad_id = ad.id;
                let playback = (i as u32 + 1) * 10 + n;
                handles.push(tokio::spawn(async move {
                    storage
                        .log_click(&create_test_click(ad_id, Utc::now(), playback))
                        .await
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for (i, ad) in ads.iter().enumerate() {
            let expected: i64 = (0..8).map(|n| ((i as i64 + 1) * 10 + n)).sum();
            let aggregate = storage.get_aggregate(ad.id).await.unwrap().unwrap();
            assert_eq!(aggregate.total_clicks, 8);
            assert_eq!(aggregate.total_playback_time, expected);
        }
    }
}

// =============================================================================
// 归档
// =============================================================================

#[cfg(test)]
mod archival_tests {
    use super::*;

    #[tokio::test]
    async fn test_old_click_moves_to_cold_once() {
        let (storage, _temp) = create_temp_storage().await;
        let ad = create_test_ad("archive");
        storage.create_ad(&ad).await.unwrap();

        let now = Utc::now();
        storage
            .log_click(&create_test_click(ad.id, now - Duration::days(40), 12))
            .await
            .unwrap();
        storage
            .log_click(&create_test_click(ad.id, now, 3))
            .await
            .unwrap();

        let before = storage.get_aggregate(ad.id).await.unwrap().unwrap();
        let moved = storage
            .archive_clicks_before(now - Duration::days(30), 1000)
            .await
            .unwrap();
        assert_eq!(moved, 1);

        let counts = storage.click_partition_counts(Some(ad.id)).await.unwrap();
        assert_eq!(counts.hot, 1);
        assert_eq!(counts.cold, 1);

        let after = storage.get_aggregate(ad.id).await.unwrap().unwrap();
        assert_eq!(after.total_clicks, before.total_clicks);
        assert_eq!(after.total_clicks as u64, counts.total());
        assert_eq!(after.total_playback_time, 15);
    }

    #[tokio::test]
    async fn test_archival_is_idempotent() {
        let (storage, _temp) = create_temp_storage().await;
        let ad = create_test_ad("idempotent");
        storage.create_ad(&ad).await.unwrap();

        let now = Utc::now();
        for days in [35, 50, 1] {
            storage
                .log_click(&create_test_click(ad.id, now - Duration::days(days), 1))
                .await
                .unwrap();
        }

        let cutoff = now - Duration::days(30);
        assert_eq!(storage.archive_clicks_before(cutoff, 1000).await.unwrap(), 2);
        let first = storage.click_partition_counts(None).await.unwrap();

        assert_eq!(storage.archive_clicks_before(cutoff, 1000).await.unwrap(), 0);
        let second = storage.click_partition_counts(None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_archival_in_small_batches() {
        let (storage, _temp) = create_temp_storage().await;
        let ad = create_test_ad("batches");
        storage.create_ad(&ad).await.unwrap();

        let old = Utc::now() - Duration::days(60);
        for i in 0..7 {
            storage
                .log_click(&create_test_click(ad.id, old + Duration::minutes(i), 2))
                .await
                .unwrap();
        }

        let moved = storage
            .archive_clicks_before(Utc::now() - Duration::days(30), 3)
            .await
            .unwrap();
        assert_eq!(moved, 7);

        let counts = storage.click_partition_counts(Some(ad.id)).await.unwrap();
        assert_eq!(counts.hot, 0);
        assert_eq!(counts.cold, 7);
    }

    #[tokio::test]
    async fn test_overlapping_archival_runs_move_each_click_once() {
        let config = DatabaseConfig {
            retry_count: 10,
            retry_base_delay_ms: 10,
            max_open_conns: 4,
            ..DatabaseConfig::default()
        };
        let (storage, _temp) = create_temp_storage_with(config).await;
        let storage = Arc::new(storage);
        let ad = create_test_ad("overlap");
        storage.create_ad(&ad).await.unwrap();

        let old = Utc::now() - Duration::days(45);
        let total = 25u64;
        for i in 0..total {
            storage
                .log_click(&create_test_click(ad.id, old + Duration::seconds(i as i64), 3))
                .await
                .unwrap();
        }
        let before = storage.get_aggregate(ad.id).await.unwrap().unwrap();

        let cutoff = Utc::now() - Duration::days(30);
        let runs: Vec<_> = (0..2)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.archive_clicks_before(cutoff, 4).await })
            })
            .collect();
        let mut moved = 0;
        for run in runs {
            moved += run.await.unwrap().unwrap();
        }
        assert_eq!(moved, total);

        let counts = storage.click_partition_counts(Some(ad.id)).await.unwrap();
        assert_eq!(counts.hot, 0);
        assert_eq!(counts.cold, total);

        let cold = archived_click::Entity::find()
            .filter(archived_click::Column::AdId.eq(ad.id))
            .all(storage.get_db())
            .await
            .unwrap();
        let unique: HashSet<Uuid> = cold.iter().map(|c| c.id).collect();
        assert_eq!(unique.len() as u64, total);

        let after = storage.get_aggregate(ad.id).await.unwrap().unwrap();
        assert_eq!(after.total_clicks, before.total_clicks);
        assert_eq!(after.total_playback_time, before.total_playback_time);
    }
}

// =============================================================================
// 分析与月度汇总
// =============================================================================

#[cfg(test)]
mod analytics_tests {
    use super::*;

    #[tokio::test]
    async fn test_window_spans_hot_and_cold() {
        let (storage, _temp) = create_temp_storage().await;
        let ad = create_test_ad("window");
        storage.create_ad(&ad).await.unwrap();

        let now = Utc::now();
        storage
            .log_click(&create_test_click(ad.id, now - Duration::days(31), 40))
            .await
            .unwrap();
        storage
            .log_click(&create_test_click(ad.id, now - Duration::minutes(5), 20))
            .await
            .unwrap();
        storage
            .archive_clicks_before(now - Duration::days(30), 1000)
            .await
            .unwrap();

        let wide = storage.ad_totals(ad.id, now - Duration::days(33)).await.unwrap();
        assert_eq!(wide.lifetime.clicks, 2);
        assert_eq!(wide.in_range.clicks, 2);
        assert_eq!(wide.in_range.playback_time, 60);

        let narrow = storage.ad_totals(ad.id, now - Duration::hours(1)).await.unwrap();
        assert_eq!(narrow.in_range.clicks, 1);
        assert_eq!(narrow.in_range.playback_time, 20);
    }

    #[tokio::test]
    async fn test_ad_totals_for_missing_ad() {
        let (storage, _temp) = create_temp_storage().await;
        let result = storage.ad_totals(Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(AdMetricsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fleet_totals() {
        let (storage, _temp) = create_temp_storage().await;
        let busy = create_test_ad("busy");
        let idle = create_test_ad("idle");
        storage.create_ad(&busy).await.unwrap();
        storage.create_ad(&idle).await.unwrap();

        let now = Utc::now();
        storage
            .log_click(&create_test_click(busy.id, now - Duration::minutes(1), 10))
            .await
            .unwrap();
        storage
            .log_click(&create_test_click(busy.id, now - Duration::days(2), 30))
            .await
            .unwrap();

        let fleet = storage.fleet_totals(now - Duration::hours(1)).await.unwrap();
        assert_eq!(fleet.ad_count, 2);
        assert_eq!(fleet.lifetime.clicks, 2);
        assert_eq!(fleet.lifetime.playback_time, 40);
        assert_eq!(fleet.in_range.clicks, 1);
        assert_eq!(fleet.in_range.playback_time, 10);
        assert_eq!(fleet.ads_in_range, 1);
    }

    #[tokio::test]
    async fn test_close_month_reads_cold_partition() {
        let (storage, _temp) = create_temp_storage().await;
        let ad = create_test_ad("monthly");
        storage.create_ad(&ad).await.unwrap();

        let march = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        storage
            .log_click(&create_test_click(ad.id, march, 15))
            .await
            .unwrap();
        storage
            .log_click(&create_test_click(ad.id, march + Duration::days(20), 5))
            .await
            .unwrap();
        storage
            .log_click(&create_test_click(ad.id, april, 100))
            .await
            .unwrap();
        storage
            .archive_clicks_before(march + Duration::days(15), 1000)
            .await
            .unwrap();

        let now = Utc::now();
        let sealed = storage.close_month(ad.id, 2026, 3, now).await.unwrap();
        assert_eq!(sealed.total_clicks, 2);
        assert_eq!(sealed.total_playback_time, 20);

        // 重复封存返回已有记录
        let again = storage.close_month(ad.id, 2026, 3, now).await.unwrap();
        assert_eq!(again.id, sealed.id);

        storage.close_month(ad.id, 2026, 2, now).await.unwrap();
        let listed = storage.list_monthly_aggregates(ad.id).await.unwrap();
        let months: Vec<u32> = listed.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![2, 3]);
        assert_eq!(listed[0].total_clicks, 0);
    }

    #[tokio::test]
    async fn test_close_month_for_missing_ad() {
        let (storage, _temp) = create_temp_storage().await;
        let result = storage
            .close_month(Uuid::new_v4(), 2026, 1, Utc::now())
            .await;
        assert!(matches!(result, Err(AdMetricsError::NotFound(_))));
    }
}
