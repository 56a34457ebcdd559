//! 点击表索引迁移
//!
//! - clicks.ad_id: 单广告窗口扫描
//! - clicks.timestamp: 归档扫描与全局窗口扫描
//! - archived_clicks (ad_id, timestamp): 冷分区窗口扫描

use sea_orm_migration::prelude::*;

use crate::m20261001_000001_initial_tables::{ClickTable, Clicks};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("clicks_ad_id_idx")
                    .table(ClickTable::Clicks)
                    .col(Clicks::AdId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("clicks_timestamp_idx")
                    .table(ClickTable::Clicks)
                    .col(Clicks::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("archived_clicks_ad_time_idx")
                    .table(ClickTable::ArchivedClicks)
                    .col(Clicks::AdId)
                    .col(Clicks::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("archived_clicks_timestamp_idx")
                    .table(ClickTable::ArchivedClicks)
                    .col(Clicks::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "archived_clicks_timestamp_idx",
            "archived_clicks_ad_time_idx",
            "clicks_timestamp_idx",
            "clicks_ad_id_idx",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }
        Ok(())
    }
}
