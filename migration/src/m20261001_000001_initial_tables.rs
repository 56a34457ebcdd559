//! 初始表迁移
//!
//! 创建广告表以及冷热两张点击表：
//! - ads: 广告实体
//! - clicks: 近期点击（热分区）
//! - archived_clicks: 归档点击（冷分区），结构与 clicks 一致

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 ads 表
        manager
            .create_table(
                Table::create()
                    .table(Ads::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ads::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Ads::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Ads::Description).text().not_null())
                    .col(ColumnDef::new(Ads::ImageUrl).text().not_null())
                    .col(ColumnDef::new(Ads::TargetUrl).text().not_null())
                    .col(
                        ColumnDef::new(Ads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建时间索引（列表按创建时间排序）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ads_created_at")
                    .table(Ads::Table)
                    .col(Ads::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 热分区与冷分区使用相同的表结构
        manager
            .create_table(click_table(ClickTable::Clicks, "fk_clicks_ad_id"))
            .await?;
        manager
            .create_table(click_table(
                ClickTable::ArchivedClicks,
                "fk_archived_clicks_ad_id",
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClickTable::ArchivedClicks).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClickTable::Clicks).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_ads_created_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Ads::Table).to_owned())
            .await
    }
}

/// 构建点击表定义（clicks / archived_clicks 共用）
fn click_table(table: ClickTable, fk_name: &str) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(Clicks::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Clicks::AdId).uuid().not_null())
        .col(
            ColumnDef::new(Clicks::Timestamp)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(Clicks::IpAddress).string_len(45).not_null())
        .col(ColumnDef::new(Clicks::PlaybackTime).integer().not_null())
        .col(
            ColumnDef::new(Clicks::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .name(fk_name)
                .from(table, Clicks::AdId)
                .to(Ads::Table, Ads::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(DeriveIden)]
pub(crate) enum Ads {
    #[sea_orm(iden = "ads")]
    Table,
    Id,
    Name,
    Description,
    ImageUrl,
    TargetUrl,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
pub(crate) enum ClickTable {
    #[sea_orm(iden = "clicks")]
    Clicks,
    #[sea_orm(iden = "archived_clicks")]
    ArchivedClicks,
}

#[derive(DeriveIden)]
pub(crate) enum Clicks {
    Id,
    AdId,
    Timestamp,
    IpAddress,
    PlaybackTime,
    CreatedAt,
}
