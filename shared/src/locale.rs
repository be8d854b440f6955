//! zh-CN display helpers
//!
//! The console renders numbers, timestamps and backend error text the way a
//! zh-CN browser would.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Placeholder for missing values
pub const EMPTY_VALUE: &str = "—";

/// Format an optional count with `,` thousands separators
pub fn format_number(value: Option<i64>) -> String {
    let Some(value) = value else {
        return EMPTY_VALUE.to_string();
    };

    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Format a stored timestamp in the local timezone as `YYYY/MM/DD HH:MM:SS`
pub fn format_local_datetime(raw: Option<&str>) -> String {
    format_datetime_in(raw, &Local)
}

/// Format a stored timestamp in the given timezone.
///
/// Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS` (read as UTC).
pub fn format_datetime_in<Tz: TimeZone>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(parsed) = raw.map(str::trim).filter(|s| !s.is_empty()).and_then(parse_timestamp) else {
        return EMPTY_VALUE.to_string();
    };

    parsed
        .with_timezone(tz)
        .format("%Y/%m/%d %H:%M:%S")
        .to_string()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn has_chinese(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// Map backend error text to a message fit for the console.
///
/// Chinese text passes through; known English failures get a fixed
/// translation; anything else becomes `fallback`.
pub fn normalize_ui_error_message(input: &str, fallback: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    if has_chinese(trimmed) {
        return trimmed.to_string();
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("unauthorized") || lower.contains("not authorized") {
        return "未登录或无权限".to_string();
    }
    if lower.contains("permission") {
        return "权限不足".to_string();
    }
    if lower.contains("duplicate") || lower.contains("unique") {
        return "数据已存在".to_string();
    }
    if lower.contains("jwt") && lower.contains("expired") {
        return "登录已过期，请重新登录".to_string();
    }

    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(None), "—");
        assert_eq!(format_number(Some(0)), "0");
        assert_eq!(format_number(Some(999)), "999");
        assert_eq!(format_number(Some(1000)), "1,000");
        assert_eq!(format_number(Some(1234567)), "1,234,567");
        assert_eq!(format_number(Some(-45210)), "-45,210");
    }

    #[test]
    fn test_format_datetime() {
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(
            format_datetime_in(Some("2024-03-01T16:05:09Z"), &shanghai),
            "2024/03/02 00:05:09"
        );
        assert_eq!(
            format_datetime_in(Some("2024-03-01 16:05:09"), &Utc),
            "2024/03/01 16:05:09"
        );
        assert_eq!(format_datetime_in(None, &Utc), "—");
        assert_eq!(format_datetime_in(Some("  "), &Utc), "—");
        assert_eq!(format_datetime_in(Some("yesterday"), &Utc), "—");
    }

    #[test]
    fn test_normalize_ui_error_message() {
        assert_eq!(normalize_ui_error_message("", "操作失败"), "操作失败");
        assert_eq!(normalize_ui_error_message("配置不存在", "操作失败"), "配置不存在");
        assert_eq!(normalize_ui_error_message("Unauthorized", "操作失败"), "未登录或无权限");
        assert_eq!(normalize_ui_error_message("permission denied for table", "x"), "权限不足");
        assert_eq!(
            normalize_ui_error_message("UNIQUE constraint failed: group_info.group_name", "x"),
            "数据已存在"
        );
        assert_eq!(normalize_ui_error_message("JWT expired", "x"), "登录已过期，请重新登录");
        assert_eq!(normalize_ui_error_message("socket hang up", "请求失败"), "请求失败");
    }
}
