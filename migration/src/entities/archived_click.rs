//! Archived click entity (cold partition)
//!
//! Same layout as `click`; rows keep their original id and created_at.

use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "archived_clicks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ad_id: Uuid,
    pub timestamp: DateTimeUtc,
    pub ip_address: String,
    pub playback_time: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<super::click::Model> for ActiveModel {
    fn from(click: super::click::Model) -> Self {
        Self {
            id: Set(click.id),
            ad_id: Set(click.ad_id),
            timestamp: Set(click.timestamp),
            ip_address: Set(click.ip_address),
            playback_time: Set(click.playback_time),
            created_at: Set(click.created_at),
        }
    }
}
