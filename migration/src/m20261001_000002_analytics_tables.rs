//! 汇总表迁移
//!
//! - aggregated_analytics: 每个广告一行的生命周期累计值（与 ads 一一对应）
//! - monthly_analytics: 每个广告每个自然月一行的封存汇总

use sea_orm_migration::prelude::*;

use crate::m20261001_000001_initial_tables::Ads;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. 创建 aggregated_analytics 表
        manager
            .create_table(
                Table::create()
                    .table(AggregatedAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AggregatedAnalytics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AggregatedAnalytics::AdId).uuid().not_null())
                    .col(
                        ColumnDef::new(AggregatedAnalytics::TotalClicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AggregatedAnalytics::TotalPlaybackTime)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AggregatedAnalytics::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AggregatedAnalytics::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_aggregated_analytics_ad_id")
                            .from(AggregatedAnalytics::Table, AggregatedAnalytics::AdId)
                            .to(Ads::Table, Ads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一索引：ad_id（保证一个广告只有一行累计值）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_aggregated_analytics_ad_id")
                    .table(AggregatedAnalytics::Table)
                    .col(AggregatedAnalytics::AdId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 2. 创建 monthly_analytics 表
        manager
            .create_table(
                Table::create()
                    .table(MonthlyAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MonthlyAnalytics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MonthlyAnalytics::AdId).uuid().not_null())
                    .col(ColumnDef::new(MonthlyAnalytics::Month).integer().not_null())
                    .col(ColumnDef::new(MonthlyAnalytics::Year).integer().not_null())
                    .col(
                        ColumnDef::new(MonthlyAnalytics::TotalClicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MonthlyAnalytics::TotalPlaybackTime)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MonthlyAnalytics::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_monthly_analytics_ad_id")
                            .from(MonthlyAnalytics::Table, MonthlyAnalytics::AdId)
                            .to(Ads::Table, Ads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一索引：ad_id + month + year
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_monthly_analytics_ad_month_year")
                    .table(MonthlyAnalytics::Table)
                    .col(MonthlyAnalytics::AdId)
                    .col(MonthlyAnalytics::Month)
                    .col(MonthlyAnalytics::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_monthly_analytics_ad_month_year")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(MonthlyAnalytics::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_aggregated_analytics_ad_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(AggregatedAnalytics::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AggregatedAnalytics {
    #[sea_orm(iden = "aggregated_analytics")]
    Table,
    Id,
    AdId,
    TotalClicks,
    TotalPlaybackTime,
    UpdatedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MonthlyAnalytics {
    #[sea_orm(iden = "monthly_analytics")]
    Table,
    Id,
    AdId,
    Month,
    Year,
    TotalClicks,
    TotalPlaybackTime,
    CreatedAt,
}
