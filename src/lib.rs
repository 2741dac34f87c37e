//! # Rust Logging Config
//!
//! One-call logging setup for services and command line tools, plus a timer
//! for instrumenting individual function calls.
//!
//! ## Features
//!
//! - **Verbosity policy**: `-v` counts map to levels, saturating at `Debug`
//! - **Two formats**: `[LEVEL file:function:line] message` text lines or
//!   one JSON object per record
//! - **Processor chain**: a fixed, inspectable sequence of enrichment steps
//! - **External loggers**: noisy dependencies are turned down to `Warning`
//! - **Handler overrides**: named loggers are rerouted to the configured handler
//! - **Call timing**: [`CallTimer`] reports the duration of any call
//!
//! Log through the macros so each record carries its file, line and
//! enclosing function. The plain [`Logger`] methods capture file and line
//! only and render the function as `?`.
//!
//! ```
//! use rust_logging_config::prelude::*;
//! use rust_logging_config::{info, warning};
//!
//! let ctx = default_logging(Verbosity::Info, LogFormat::Structured, &["hyper"], &[]).unwrap();
//! let logger = ctx.logger("app");
//! info!(logger, "listening on port {}", 8080);
//! warning!(logger, "cache cold"; entries = 0);
//!
//! let timer = CallTimer::new(logger, false);
//! assert_eq!(timer.call("answer", (), |()| 42), 42);
//! ```

pub mod core;
pub mod handlers;
pub mod macros;
pub mod timer;

pub mod prelude {
    pub use crate::core::{
        configure, default_logging, EventDict, FieldValue, LogFormat, LogLevel, LogRecord,
        Logger, LoggerError, LoggingConfig, LoggingContext, Result, TimestampFormat, Verbosity,
    };
    pub use crate::handlers::{SharedBuffer, Sink};
    pub use crate::timer::{CallTimer, LogFacade};
}

pub use crate::core::{
    configure, default_logging, level_for, ExceptionInfo, EventDict, FieldValue, Formatter,
    Handler, LogFormat, LogLevel, LogRecord, Logger, LoggerError, LoggerRegistry,
    LoggingConfig, LoggingConfigBuilder, LoggingContext, LoggingMetrics, ProcessorChain, Result,
    StructuredFormatter, TextFormatter, TimestampFormat, Verbosity, TEXT_LOG_FORMAT,
};
pub use handlers::{SharedBuffer, Sink, StreamHandler};
pub use timer::{CallTimer, Clock, LogFacade, ManualClock, MonotonicClock};
