//! Logging configuration
//!
//! [`LoggingConfig`] describes the whole pipeline: verbosity, output format,
//! the external loggers to turn down and the loggers whose handlers must be
//! replaced. [`configure`] turns it into a live [`LoggingContext`].

use super::context::LoggingContext;
use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use super::verbosity::Verbosity;
use crate::handlers::Sink;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format to write logs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `[LEVEL file:function:line] message`
    #[default]
    Text,
    /// One JSON object per record
    #[serde(alias = "json")]
    Structured,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Structured => write!(f, "structured"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" | "structured" => Ok(LogFormat::Structured),
            _ => Err(LoggerError::unsupported_format(s)),
        }
    }
}

/// Complete description of a logging pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// A name (`"info"`) or a `-v` count (`1`); counts saturate at `Max`
    #[serde(deserialize_with = "verbosity_name_or_ordinal")]
    pub verbosity: Verbosity,
    pub format: LogFormat,
    /// Loggers turned down to `Warning` unless verbosity is `Max`
    pub external_logs: Vec<String>,
    /// Loggers whose handlers are replaced (structured format only)
    pub override_logs: Vec<String>,
    #[serde(skip)]
    pub sink: Sink,
    /// Adds a `timestamp` field to every event when set
    pub timestamps: Option<TimestampFormat>,
    /// Colour level names in text output
    pub colors: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VerbosityRepr {
    Ordinal(u64),
    Name(String),
}

fn verbosity_name_or_ordinal<'de, D>(deserializer: D) -> std::result::Result<Verbosity, D::Error>
where
    D: Deserializer<'de>,
{
    match VerbosityRepr::deserialize(deserializer)? {
        VerbosityRepr::Ordinal(n) => Ok(Verbosity::from_ordinal(
            u32::try_from(n).unwrap_or(u32::MAX),
        )),
        VerbosityRepr::Name(name) => name.parse().map_err(serde::de::Error::custom),
    }
}

impl LoggingConfig {
    #[must_use]
    pub fn builder() -> LoggingConfigBuilder {
        LoggingConfigBuilder::new()
    }

    /// Read a configuration from JSON
    ///
    /// ```
    /// use rust_logging_config::{LogFormat, LoggingConfig, Verbosity};
    ///
    /// let config = LoggingConfig::from_json(
    ///     r#"{"verbosity": "debug", "format": "json", "external_logs": ["hyper"]}"#,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(config.verbosity, Verbosity::Debug);
    /// assert_eq!(config.format, LogFormat::Structured);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Threshold installed on the root logger and the handler
    pub fn level(&self) -> LogLevel {
        self.verbosity.level()
    }

    /// Whether external loggers are turned down under this configuration
    pub fn suppresses_external(&self) -> bool {
        !self.external_logs.is_empty() && self.verbosity.suppresses_external()
    }

    pub fn validate(&self) -> Result<()> {
        let names = self.external_logs.iter().map(|name| ("external_logs", name));
        let names = names.chain(self.override_logs.iter().map(|name| ("override_logs", name)));
        for (component, name) in names {
            if name.trim().is_empty() {
                return Err(LoggerError::config(component, "logger names must not be empty"));
            }
        }
        Ok(())
    }
}

/// Builder for [`LoggingConfig`]
///
/// ```
/// use rust_logging_config::prelude::*;
///
/// let config = LoggingConfig::builder()
///     .verbosity(Verbosity::Info)
///     .format(LogFormat::Structured)
///     .external_logs(["hyper", "rustls"])
///     .override_logs(["svc.access"])
///     .build();
///
/// assert_eq!(config.level(), LogLevel::Info);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggingConfigBuilder {
    config: LoggingConfig,
}

impl LoggingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn verbosity(mut self, verbosity: impl Into<Verbosity>) -> Self {
        self.config.verbosity = verbosity.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn external_logs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.external_logs = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn override_logs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.override_logs = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: Sink) -> Self {
        self.config.sink = sink;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamps(mut self, format: TimestampFormat) -> Self {
        self.config.timestamps = Some(format);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, colors: bool) -> Self {
        self.config.colors = colors;
        self
    }

    pub fn build(self) -> LoggingConfig {
        self.config
    }

    /// Build and install in one step
    pub fn configure(self) -> Result<LoggingContext> {
        configure(self.config)
    }
}

/// Build a fresh [`LoggingContext`] from `config`.
pub fn configure(config: LoggingConfig) -> Result<LoggingContext> {
    let context = LoggingContext::new();
    context.reconfigure(&config)?;
    Ok(context)
}

/// Configure logging based on the given parameters.
///
/// Logging is written to stdout. An empty slice means the list was not given.
///
/// ```
/// use rust_logging_config::{default_logging, LogFormat, LogLevel, Verbosity};
///
/// let ctx = default_logging(Verbosity::Info, LogFormat::Text, &["hyper"], &[]).unwrap();
///
/// assert_eq!(ctx.registry().effective_level("app"), LogLevel::Info);
/// assert_eq!(ctx.registry().effective_level("hyper"), LogLevel::Warning);
/// ```
pub fn default_logging(
    verbosity: impl Into<Verbosity>,
    log_format: LogFormat,
    external_logs: &[&str],
    override_logs: &[&str],
) -> Result<LoggingContext> {
    LoggingConfig::builder()
        .verbosity(verbosity)
        .format(log_format)
        .external_logs(external_logs.iter().copied())
        .override_logs(override_logs.iter().copied())
        .configure()
}
