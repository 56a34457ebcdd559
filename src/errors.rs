use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdMetricsError {
    InvalidArgument(String),
    NotFound(String),
    StorageUnavailable(String),
    TransactionFailed(String),
    DatabaseConfig(String),
    Serialization(String),
}

impl AdMetricsError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AdMetricsError::InvalidArgument(_) => "E001",
            AdMetricsError::NotFound(_) => "E002",
            AdMetricsError::StorageUnavailable(_) => "E003",
            AdMetricsError::TransactionFailed(_) => "E004",
            AdMetricsError::DatabaseConfig(_) => "E005",
            AdMetricsError::Serialization(_) => "E006",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AdMetricsError::InvalidArgument(_) => "Invalid Argument",
            AdMetricsError::NotFound(_) => "Resource Not Found",
            AdMetricsError::StorageUnavailable(_) => "Storage Unavailable",
            AdMetricsError::TransactionFailed(_) => "Transaction Failed",
            AdMetricsError::DatabaseConfig(_) => "Database Configuration Error",
            AdMetricsError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AdMetricsError::InvalidArgument(msg) => msg,
            AdMetricsError::NotFound(msg) => msg,
            AdMetricsError::StorageUnavailable(msg) => msg,
            AdMetricsError::TransactionFailed(msg) => msg,
            AdMetricsError::DatabaseConfig(msg) => msg,
            AdMetricsError::Serialization(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    #[cfg(feature = "server")]
    pub fn http_status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AdMetricsError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AdMetricsError::NotFound(_) => StatusCode::NOT_FOUND,
            AdMetricsError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AdMetricsError::TransactionFailed(_)
            | AdMetricsError::DatabaseConfig(_)
            | AdMetricsError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AdMetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AdMetricsError {}

// 便捷的构造函数
impl AdMetricsError {
    pub fn invalid_argument<T: Into<String>>(msg: T) -> Self {
        AdMetricsError::InvalidArgument(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        AdMetricsError::NotFound(msg.into())
    }

    pub fn storage_unavailable<T: Into<String>>(msg: T) -> Self {
        AdMetricsError::StorageUnavailable(msg.into())
    }

    pub fn transaction_failed<T: Into<String>>(msg: T) -> Self {
        AdMetricsError::TransactionFailed(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        AdMetricsError::DatabaseConfig(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AdMetricsError::Serialization(msg.into())
    }

    /// 给存储层错误加上操作上下文，保留原有分类
    pub fn with_context(self, context: &str) -> Self {
        match self {
            AdMetricsError::StorageUnavailable(msg) => {
                AdMetricsError::StorageUnavailable(format!("{}: {}", context, msg))
            }
            AdMetricsError::TransactionFailed(msg) => {
                AdMetricsError::TransactionFailed(format!("{}: {}", context, msg))
            }
            other => other,
        }
    }
}

// 连接类错误归为 StorageUnavailable，记录缺失归为 NotFound，其余归为 TransactionFailed
impl From<sea_orm::DbErr> for AdMetricsError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::DbErr;
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                AdMetricsError::StorageUnavailable(err.to_string())
            }
            DbErr::RecordNotFound(msg) => AdMetricsError::NotFound(msg),
            other => AdMetricsError::TransactionFailed(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AdMetricsError {
    fn from(err: serde_json::Error) -> Self {
        AdMetricsError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdMetricsError>;
