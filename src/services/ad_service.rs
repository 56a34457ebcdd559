//! Ad registry service
//!
//! Validates ad input and pagination parameters before they reach storage.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AdMetricsError, Result};
use crate::storage::{Ad, AdFilter, AdRepository, SortOrder};
use crate::utils::validation::{
    parse_ad_id, validate_image_ref, validate_name, validate_target_url,
};

/// 单页最大行数
pub const MAX_PAGE_ROWS: u64 = 100;

// ============ Request/Response DTOs ============

/// Request to create a new ad
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_url: String,
    pub target_url: String,
}

/// Raw list parameters as they arrive from a query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAdsParams {
    pub search: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub rows: Option<String>,
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub total_pages: u64,
    /// 本页行数
    pub total_rows: u64,
    pub page_size: u64,
    /// 满足条件的总行数
    pub total_count: u64,
}

fn parse_positive(name: &str, raw: Option<&str>, default: u64) -> Result<u64> {
    let invalid = || {
        AdMetricsError::invalid_argument(format!(
            "invalid value for query param `{}` provided",
            name
        ))
    };
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s
            .parse::<u64>()
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(invalid),
    }
}

impl ListAdsParams {
    /// 校验并转换为存储层过滤条件
    pub fn into_filter(self) -> Result<AdFilter> {
        let page = parse_positive("page", self.page.as_deref(), 1)?;
        let rows = parse_positive("rows", self.rows.as_deref(), 25)?;
        if rows > MAX_PAGE_ROWS {
            return Err(AdMetricsError::invalid_argument(
                "invalid value for query param `rows` provided",
            ));
        }

        let order = match self.order.as_deref().map(str::trim) {
            None | Some("") => SortOrder::default(),
            Some(s) => s.parse::<SortOrder>()?,
        };

        Ok(AdFilter {
            search: self.search,
            order,
            page,
            rows,
        })
    }
}

// ============ AdService ============

pub struct AdService {
    storage: Arc<dyn AdRepository>,
}

impl AdService {
    pub fn new(storage: Arc<dyn AdRepository>) -> Self {
        Self { storage }
    }

    pub async fn create_ad(&self, req: CreateAdRequest) -> Result<Ad> {
        validate_name(&req.name)?;
        validate_image_ref(&req.image_url)?;
        validate_target_url(&req.target_url)?;

        let ad = Ad {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            description: req.description,
            image_url: req.image_url.trim().to_string(),
            target_url: req.target_url.trim().to_string(),
            created_at: Utc::now(),
        };

        self.storage.create_ad(&ad).await?;
        info!("AdService: created ad '{}' ({})", ad.name, ad.id);
        Ok(ad)
    }

    pub async fn get_ad(&self, raw_id: &str) -> Result<Ad> {
        let id = parse_ad_id(raw_id)?;
        self.storage
            .get_ad(id)
            .await?
            .ok_or_else(|| AdMetricsError::not_found("Ad not found"))
    }

    pub async fn list_ads(&self, params: ListAdsParams) -> Result<Page<Ad>> {
        let filter = params.into_filter()?;

        let total_count = self.storage.count_ads(filter.search.as_deref()).await?;
        let items = self.storage.list_ads(&filter).await?;

        Ok(Page {
            total_rows: items.len() as u64,
            page_number: filter.page,
            total_pages: total_count.div_ceil(filter.rows),
            page_size: filter.rows,
            total_count,
            items,
        })
    }
}
