use sea_orm::ActiveValue::Set;

use crate::storage::models::{Ad, Aggregate, Click, MonthlyAggregate};
use migration::entities::{ad, aggregated_analytics, click, monthly_analytics};

/// 将 Sea-ORM Model 转换为 Ad
pub fn model_to_ad(model: ad::Model) -> Ad {
    Ad {
        id: model.id,
        name: model.name,
        description: model.description,
        image_url: model.image_url,
        target_url: model.target_url,
        created_at: model.created_at,
    }
}

pub fn ad_to_active_model(ad: &Ad) -> ad::ActiveModel {
    ad::ActiveModel {
        id: Set(ad.id),
        name: Set(ad.name.clone()),
        description: Set(ad.description.clone()),
        image_url: Set(ad.image_url.clone()),
        target_url: Set(ad.target_url.clone()),
        created_at: Set(ad.created_at),
    }
}

/// 新广告对应的全零累计值行
pub fn zero_aggregate_for(ad: &Ad) -> aggregated_analytics::ActiveModel {
    aggregated_analytics::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        ad_id: Set(ad.id),
        total_clicks: Set(0),
        total_playback_time: Set(0),
        updated_at: Set(ad.created_at),
        created_at: Set(ad.created_at),
    }
}

pub fn model_to_aggregate(model: aggregated_analytics::Model) -> Aggregate {
    Aggregate {
        id: model.id,
        ad_id: model.ad_id,
        total_clicks: model.total_clicks,
        total_playback_time: model.total_playback_time,
        updated_at: model.updated_at,
        created_at: model.created_at,
    }
}

/// playback_time 在入口已限制在 i32 范围内
pub fn click_to_active_model(click: &Click) -> click::ActiveModel {
    click::ActiveModel {
        id: Set(click.id),
        ad_id: Set(click.ad_id),
        timestamp: Set(click.timestamp),
        ip_address: Set(click.ip_address.clone()),
        playback_time: Set(click.playback_time.min(i32::MAX as u32) as i32),
        created_at: Set(click.created_at),
    }
}

pub fn model_to_monthly(model: monthly_analytics::Model) -> MonthlyAggregate {
    MonthlyAggregate {
        id: model.id,
        ad_id: model.ad_id,
        month: model.month.max(0) as u32,
        year: model.year,
        total_clicks: model.total_clicks,
        total_playback_time: model.total_playback_time,
        created_at: model.created_at,
    }
}

pub fn monthly_to_active_model(monthly: &MonthlyAggregate) -> monthly_analytics::ActiveModel {
    monthly_analytics::ActiveModel {
        id: Set(monthly.id),
        ad_id: Set(monthly.ad_id),
        month: Set(monthly.month as i32),
        year: Set(monthly.year),
        total_clicks: Set(monthly.total_clicks),
        total_playback_time: Set(monthly.total_playback_time),
        created_at: Set(monthly.created_at),
    }
}
