//! 时间显示模块
//!
//! 服务端的 `createdAt` 是 RFC 3339 字符串，列表视图只需要日期部分。

use chrono::DateTime;

/// 把 RFC 3339 时间戳格式化为表格展示用的日期
///
/// 解析失败时原样返回输入，不报错。
pub fn display_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_rfc3339_timestamps() {
        assert_eq!(display_date("2024-01-15T10:30:00Z"), "2024-01-15");
        assert_eq!(display_date("2024-01-15T10:30:00.000+08:00"), "2024-01-15");
    }

    #[test]
    fn unparsable_input_passes_through() {
        assert_eq!(display_date("yesterday"), "yesterday");
    }
}
