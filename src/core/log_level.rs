//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a record and threshold of a logger or handler.
///
/// Numeric values follow the common convention where a larger value is more
/// severe, so a threshold of `Warning` admits `Warning`, `Error` and
/// `Critical` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 10,
    #[default]
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Lower-case name, used for the `level` field of structured records
    pub fn as_field(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }

    /// Numeric severity (10, 20, 30, 40, 50)
    #[inline]
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Whether a record at `level` passes this threshold
    #[inline]
    pub fn admits(&self, level: LogLevel) -> bool {
        level >= *self
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warning => Yellow,
            LogLevel::Error => Red,
            LogLevel::Critical => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values() {
        assert_eq!(LogLevel::Debug.value(), 10);
        assert_eq!(LogLevel::Info.value(), 20);
        assert_eq!(LogLevel::Warning.value(), 30);
        assert_eq!(LogLevel::Error.value(), 40);
        assert_eq!(LogLevel::Critical.value(), 50);
    }

    #[test]
    fn test_admits() {
        assert!(LogLevel::Warning.admits(LogLevel::Error));
        assert!(LogLevel::Warning.admits(LogLevel::Warning));
        assert!(!LogLevel::Warning.admits(LogLevel::Info));
        assert!(LogLevel::Debug.admits(LogLevel::Debug));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("Fatal".parse::<LogLevel>(), Ok(LogLevel::Critical));
        assert!("verbose".parse::<LogLevel>().is_err());
    }
}
