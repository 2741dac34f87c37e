//! Core logging types and traits

pub mod config;
pub mod context;
pub mod error;
pub mod event_dict;
pub mod formatter;
pub mod handler;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod processor;
pub mod registry;
pub mod timestamp;
pub mod verbosity;

pub use config::{configure, default_logging, LogFormat, LoggingConfig, LoggingConfigBuilder};
pub use context::LoggingContext;
pub use error::{LoggerError, Result};
pub use event_dict::{EventDict, FieldValue};
pub use formatter::{Formatter, StructuredFormatter, TextFormatter, TEXT_LOG_FORMAT};
pub use handler::{same_handler, Handler};
pub use log_level::LogLevel;
pub use log_record::{ExceptionInfo, LogRecord};
pub use logger::Logger;
pub use metrics::LoggingMetrics;
pub use processor::{interpolate, ProcessScope, Processor, ProcessorChain};
pub use registry::{LoggerNode, LoggerRegistry, ROOT_LOGGER_NAME};
pub use timestamp::TimestampFormat;
pub use verbosity::{level_for, Verbosity, VERBOSE_LEVELS};
