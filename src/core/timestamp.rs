//! Timestamp formats for the `timestamper` processor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the `timestamp` field is rendered
///
/// Unix-based variants become JSON numbers in structured output; every other
/// variant is a string.
///
/// ```
/// use rust_logging_config::core::TimestampFormat;
/// use chrono::Utc;
///
/// let stamp = TimestampFormat::Iso8601.format(&Utc::now());
/// assert!(stamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,
    /// `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,
    /// Seconds since the epoch
    Unix,
    /// Milliseconds since the epoch
    UnixMillis,
    /// Any strftime-compatible pattern
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(pattern) => datetime.format(pattern).to_string(),
        }
    }

    /// Numeric value for Unix-based formats, `None` for textual ones
    #[must_use]
    pub fn numeric_value(&self, datetime: &DateTime<Utc>) -> Option<i64> {
        match self {
            TimestampFormat::Unix => Some(datetime.timestamp()),
            TimestampFormat::UnixMillis => Some(datetime.timestamp_millis()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_iso8601_format() {
        assert_eq!(
            TimestampFormat::Iso8601.format(&fixed_datetime()),
            "2025-01-08T10:30:45.123Z"
        );
    }

    #[test]
    fn test_numeric_values() {
        let dt = fixed_datetime();
        assert_eq!(TimestampFormat::Unix.numeric_value(&dt), Some(1736332245));
        assert_eq!(TimestampFormat::UnixMillis.numeric_value(&dt), Some(1736332245123));
        assert_eq!(TimestampFormat::Rfc3339.numeric_value(&dt), None);
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat::Custom("%Y/%m/%d %H:%M".to_string());
        assert_eq!(format.format(&fixed_datetime()), "2025/01/08 10:30");
    }

    #[test]
    fn test_deserialization() {
        let format: TimestampFormat = serde_json::from_str("\"unix_millis\"").expect("deserialize");
        assert_eq!(format, TimestampFormat::UnixMillis);

        let format: TimestampFormat =
            serde_json::from_str(r#"{"custom":"%Y-%m-%d"}"#).expect("deserialize custom");
        assert_eq!(format, TimestampFormat::Custom("%Y-%m-%d".to_string()));
    }
}
