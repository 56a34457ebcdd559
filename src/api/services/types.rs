//! 响应结构

use serde::Serialize;

use crate::services::Page;
use crate::storage::Ad;

/// 统一响应信封
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub trace_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

/// 分页信息
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub page_number: u64,
    pub total_pages: u64,
    pub total_rows: u64,
    pub page_size: u64,
    pub total_count: u64,
}

/// 广告列表
#[derive(Debug, Serialize)]
pub struct AdListResult {
    pub values: Vec<Ad>,
    pub pages: PageInfo,
}

impl From<Page<Ad>> for AdListResult {
    fn from(page: Page<Ad>) -> Self {
        Self {
            pages: PageInfo {
                page_number: page.page_number,
                total_pages: page.total_pages,
                total_rows: page.total_rows,
                page_size: page.page_size,
                total_count: page.total_count,
            },
            values: page.items,
        }
    }
}

/// 健康检查结果
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub timestamp: String,
    pub uptime: u64,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
