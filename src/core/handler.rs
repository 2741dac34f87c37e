//! Handler trait for log output destinations

use super::{error::Result, event_dict::EventDict, log_level::LogLevel, log_record::LogRecord};
use std::sync::Arc;

/// A configured output route: a threshold, a formatter and a sink.
///
/// Handlers are shared between loggers, so every method takes `&self` and
/// implementations synchronise their own output.
pub trait Handler: Send + Sync {
    /// Format and write one record. `event` is `None` for foreign records.
    fn handle(&self, record: &LogRecord, event: Option<&EventDict>) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn name(&self) -> &str;
    fn level(&self) -> LogLevel;
    fn set_level(&self, level: LogLevel);
}

/// Handlers are compared by identity, not by value.
pub fn same_handler(a: &Arc<dyn Handler>, b: &Arc<dyn Handler>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
