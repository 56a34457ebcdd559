//! 输入校验
//!
//! 广告字段与点击字段的边界检查，全部返回 `InvalidArgument`。

use url::Url;
use uuid::Uuid;

use crate::errors::{AdMetricsError, Result};

/// 广告名称最大长度
pub const MAX_NAME_LEN: usize = 255;

/// 来源地址最大长度（IPv6 文本形式上限）
pub const MAX_IP_LEN: usize = 45;

/// 解析广告 id
pub fn parse_ad_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AdMetricsError::invalid_argument("Invalid ad ID"))
}

pub fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AdMetricsError::invalid_argument("name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AdMetricsError::invalid_argument(format!(
            "name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

pub fn validate_image_ref(image_url: &str) -> Result<()> {
    if image_url.trim().is_empty() {
        return Err(AdMetricsError::invalid_argument("image_url cannot be empty"));
    }
    Ok(())
}

/// 目标地址必须是可解析的 http(s) URL
pub fn validate_target_url(target: &str) -> Result<()> {
    let target = target.trim();
    if target.is_empty() {
        return Err(AdMetricsError::invalid_argument("target_url cannot be empty"));
    }

    let parsed = Url::parse(target).map_err(|e| {
        AdMetricsError::invalid_argument(format!("Invalid target_url format: {}", e))
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AdMetricsError::invalid_argument(format!(
            "Invalid target_url protocol: {}. Only http:// and https:// are allowed",
            other
        ))),
    }
}

pub fn validate_ip_address(ip: &str) -> Result<()> {
    if ip.len() > MAX_IP_LEN {
        return Err(AdMetricsError::invalid_argument(format!(
            "ip_address exceeds {} characters",
            MAX_IP_LEN
        )));
    }
    Ok(())
}

/// playback_time 存储为 INTEGER
pub fn validate_playback_time(seconds: u32) -> Result<()> {
    if seconds > i32::MAX as u32 {
        return Err(AdMetricsError::invalid_argument(format!(
            "playback_time exceeds {}",
            i32::MAX
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ad_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_ad_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_ad_id("not-a-uuid"),
            Err(AdMetricsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_target_url_protocols() {
        assert!(validate_target_url("https://example.com/landing?x=1").is_ok());
        assert!(validate_target_url("HTTP://example.com").is_ok());
        assert!(validate_target_url("javascript:alert(1)").is_err());
        assert!(validate_target_url("ftp://example.com").is_err());
        assert!(validate_target_url("   ").is_err());
    }

    #[test]
    fn test_name_bounds() {
        assert!(validate_name("Summer Sale").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_click_field_bounds() {
        assert!(validate_ip_address("2001:0db8:85a3:0000:0000:8a2e:0370:7334").is_ok());
        assert!(validate_ip_address(&"1".repeat(46)).is_err());
        assert!(validate_playback_time(i32::MAX as u32).is_ok());
        assert!(validate_playback_time(i32::MAX as u32 + 1).is_err());
    }
}
