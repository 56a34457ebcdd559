//! Click entity (hot partition)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "clicks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ad_id: Uuid,
    /// 播放发生的时间（可由调用方回填）
    pub timestamp: DateTimeUtc,
    pub ip_address: String,
    /// 播放时长（秒）
    pub playback_time: i32,
    /// 写入时间
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
