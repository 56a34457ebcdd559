//! Click ingestion service

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::Result;
use crate::metrics_core::MetricsRecorder;
use crate::storage::{AdRepository, Click};
use crate::utils::validation::{parse_ad_id, validate_ip_address, validate_playback_time};

/// 无法确定来源地址时写入的占位值
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Request to log a click
#[derive(Debug, Clone, Deserialize)]
pub struct LogClickRequest {
    pub ad_id: String,
    /// 缺省为 now − playback_time
    pub timestamp: Option<DateTime<Utc>>,
    /// 缺省为连接对端地址
    pub ip_address: Option<String>,
    #[serde(default)]
    pub playback_time: u32,
}

pub struct ClickService {
    storage: Arc<dyn AdRepository>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl ClickService {
    pub fn new(storage: Arc<dyn AdRepository>, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self { storage, metrics }
    }

    /// 记录一次点击
    ///
    /// `peer_address` 为传输层对端 IP，仅在请求未携带 `ip_address` 时使用。
    pub async fn log_click(
        &self,
        req: LogClickRequest,
        peer_address: Option<String>,
    ) -> Result<Click> {
        let ad_id = parse_ad_id(&req.ad_id)?;
        validate_playback_time(req.playback_time)?;

        let ip_address = req
            .ip_address
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or(peer_address)
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string());
        validate_ip_address(&ip_address)?;

        let now = Utc::now();
        let click = Click {
            id: Uuid::new_v4(),
            ad_id,
            timestamp: req
                .timestamp
                .unwrap_or_else(|| now - Duration::seconds(i64::from(req.playback_time))),
            ip_address,
            playback_time: req.playback_time,
            created_at: now,
        };

        self.storage.log_click(&click).await?;
        self.metrics.inc_clicks_logged();

        debug!("ClickService: click {} logged for ad {}", click.id, ad_id);
        Ok(click)
    }
}
