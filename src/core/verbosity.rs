//! Verbosity policy
//!
//! Maps the caller's verbosity ordinal (typically the number of `-v` flags)
//! onto a [`LogLevel`]. Ordinals past the end of the table saturate at the
//! most permissive level instead of failing.

use super::error::LoggerError;
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Levels indexed by verbosity ordinal.
pub const VERBOSE_LEVELS: [LogLevel; 3] = [LogLevel::Warning, LogLevel::Info, LogLevel::Debug];

/// Verbosity level for logging. The higher the level the more logging we do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Warning = 0,
    Info = 1,
    Debug = 2,
    /// Most verbose setting; also disables external logger suppression.
    Max = 3,
}

impl Verbosity {
    /// Convert an ordinal, saturating at [`Verbosity::Max`].
    pub fn from_ordinal(ordinal: u32) -> Self {
        match ordinal {
            0 => Verbosity::Warning,
            1 => Verbosity::Info,
            2 => Verbosity::Debug,
            _ => Verbosity::Max,
        }
    }

    #[inline]
    pub fn ordinal(&self) -> u32 {
        *self as u32
    }

    /// Get the log level for this verbosity.
    #[inline]
    pub fn level(&self) -> LogLevel {
        level_for(self.ordinal())
    }

    /// Whether external loggers should be turned down at this verbosity.
    #[inline]
    pub fn suppresses_external(&self) -> bool {
        *self < Verbosity::Max
    }
}

/// Level for an arbitrary verbosity ordinal.
///
/// Total over all ordinals: anything past the table returns its last entry.
pub fn level_for(ordinal: u32) -> LogLevel {
    VERBOSE_LEVELS
        .get(ordinal as usize)
        .copied()
        .unwrap_or(VERBOSE_LEVELS[VERBOSE_LEVELS.len() - 1])
}

impl From<u8> for Verbosity {
    fn from(ordinal: u8) -> Self {
        Verbosity::from_ordinal(u32::from(ordinal))
    }
}

impl From<u32> for Verbosity {
    fn from(ordinal: u32) -> Self {
        Verbosity::from_ordinal(ordinal)
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verbosity::Warning => "warning",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Max => "max",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Verbosity {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "warning" | "warn" => Ok(Verbosity::Warning),
            "info" => Ok(Verbosity::Info),
            "debug" => Ok(Verbosity::Debug),
            "max" => Ok(Verbosity::Max),
            other => other
                .parse::<u32>()
                .map(Verbosity::from_ordinal)
                .map_err(|_| LoggerError::unsupported_verbosity(trimmed)),
        }
    }
}
