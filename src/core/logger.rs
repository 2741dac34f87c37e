//! Named logger handle

use super::context::LoggingContext;
use super::event_dict::{EventDict, FieldValue};
use super::handler::Handler;
use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::registry::LoggerNode;
use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// A named entry point into a [`LoggingContext`]
///
/// Loggers are cheap handles: level and handlers live in the context's
/// registry, so two loggers with the same name share them. Fields attached
/// with [`bind`](Logger::bind) are added to every record this handle emits.
#[derive(Clone)]
pub struct Logger {
    name: String,
    context: LoggingContext,
    bound: EventDict,
}

impl Logger {
    pub fn new(name: impl Into<String>, context: LoggingContext) -> Self {
        Self {
            name: name.into(),
            context,
            bound: EventDict::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &LoggingContext {
        &self.context
    }

    /// A new handle that adds `key` to every record.
    #[must_use]
    pub fn bind(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let mut logger = self.clone();
        logger.bound.insert(key, value);
        logger
    }

    pub fn bound_fields(&self) -> &EventDict {
        &self.bound
    }

    /// Registry node backing this logger
    pub fn node(&self) -> Arc<LoggerNode> {
        self.context.node(&self.name)
    }

    /// Own threshold; `None` when inherited from an ancestor
    pub fn level(&self) -> Option<LogLevel> {
        self.node().level()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.node().set_level(level);
    }

    pub fn effective_level(&self) -> LogLevel {
        self.context.registry().effective_level(&self.name)
    }

    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        self.effective_level().admits(level)
    }

    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.node().add_handler(handler);
    }

    pub fn clear_handlers(&self) {
        self.node().clear_handlers();
    }

    pub fn handler_count(&self) -> usize {
        self.node().handler_count()
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.node().set_propagate(propagate);
    }

    fn record(&self, level: LogLevel, message: &str, caller: &Location<'_>) -> LogRecord {
        LogRecord::new(level, self.name.as_str(), message).with_caller(caller)
    }

    /// Log `message` at `level`.
    ///
    /// File and line come from the caller; the function slot stays `?`
    /// because only the [`log!`](crate::log) family of macros can see the
    /// enclosing function's name.
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if !self.is_enabled_for(level) {
            self.context.metrics().record_filtered();
            return;
        }
        self.emit(self.record(level, message.as_ref(), Location::caller()));
    }

    /// Log with extra key/value fields
    #[track_caller]
    pub fn log_with_fields(&self, level: LogLevel, message: impl AsRef<str>, fields: EventDict) {
        if !self.is_enabled_for(level) {
            self.context.metrics().record_filtered();
            return;
        }
        self.emit(
            self.record(level, message.as_ref(), Location::caller())
                .with_fields(fields),
        );
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn critical(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Critical, message);
    }

    /// Log at `Error` with the error and its source chain as `exception`
    #[track_caller]
    pub fn exception<E>(&self, message: impl AsRef<str>, err: &E)
    where
        E: Error + ?Sized,
    {
        if !self.is_enabled_for(LogLevel::Error) {
            self.context.metrics().record_filtered();
            return;
        }
        self.emit(
            self.record(LogLevel::Error, message.as_ref(), Location::caller())
                .with_exception(err),
        );
    }

    /// Send a prepared record through the processor chain.
    ///
    /// Bound fields are added where the record does not set them itself.
    pub fn emit(&self, mut record: LogRecord) {
        if record.logger != self.name {
            record.logger = self.name.clone();
        }
        record.fields.merge_missing(&self.bound);
        self.context.emit(record);
    }

    /// Hand a record straight to the handlers, skipping the processor chain.
    ///
    /// For records produced outside this crate's call sites. The structured
    /// formatter enriches such records with its foreign pre-chain.
    pub fn log_record(&self, mut record: LogRecord) {
        if record.logger != self.name {
            record.logger = self.name.clone();
        }
        record.fields.merge_missing(&self.bound);
        self.context.emit_foreign(record);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("bound", &self.bound)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogFormat, LoggingConfig, Verbosity};
    use crate::handlers::{SharedBuffer, Sink};

    fn text_context(verbosity: Verbosity) -> (LoggingContext, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let ctx = LoggingConfig::builder()
            .verbosity(verbosity)
            .sink(Sink::Buffer(buffer.clone()))
            .configure()
            .unwrap();
        (ctx, buffer)
    }

    #[test]
    fn test_track_caller_location() {
        let (ctx, buffer) = text_context(Verbosity::Info);
        let line = line!() + 1;
        ctx.logger("app").info("located");

        assert_eq!(buffer.contents(), format!("[INFO logger.rs:?:{}] located\n", line));
    }

    #[test]
    fn test_levels_follow_threshold() {
        let (ctx, buffer) = text_context(Verbosity::Warning);
        let logger = ctx.logger("app");

        logger.debug("d");
        logger.info("i");
        logger.warning("w");
        logger.error("e");
        logger.critical("c");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[WARNING "));
        assert!(lines[1].starts_with("[ERROR "));
        assert!(lines[2].starts_with("[CRITICAL "));
    }

    #[test]
    fn test_same_name_shares_state() {
        let (ctx, _buffer) = text_context(Verbosity::Warning);
        ctx.logger("svc").set_level(LogLevel::Debug);

        let other = ctx.logger("svc");
        assert_eq!(other.level(), Some(LogLevel::Debug));
        assert!(ctx.logger("svc.child").is_enabled_for(LogLevel::Debug));
    }

    #[test]
    fn test_bound_fields_in_structured_output() {
        let buffer = SharedBuffer::new();
        let ctx = LoggingConfig::builder()
            .verbosity(Verbosity::Info)
            .format(LogFormat::Structured)
            .sink(Sink::Buffer(buffer.clone()))
            .configure()
            .unwrap();

        let logger = ctx.logger("svc").bind("request_id", "abc").bind("attempt", 1);
        logger.log_with_fields(
            LogLevel::Info,
            "handled",
            EventDict::new().with_field("attempt", 2),
        );

        let parsed: serde_json::Value = serde_json::from_str(buffer.lines()[0].as_str()).unwrap();
        assert_eq!(parsed["request_id"], "abc");
        assert_eq!(parsed["attempt"], 2);
        assert_eq!(parsed["logger"], "svc");
    }

    #[test]
    fn test_exception_text_output() {
        let (ctx, buffer) = text_context(Verbosity::Info);
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        ctx.logger("app").exception("write failed", &err);

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] write failed"));
        assert!(lines[1].ends_with(": disk full"));
    }

    #[test]
    fn test_log_record_bypasses_chain() {
        let buffer = SharedBuffer::new();
        let ctx = LoggingConfig::builder()
            .verbosity(Verbosity::Debug)
            .format(LogFormat::Structured)
            .sink(Sink::Buffer(buffer.clone()))
            .configure()
            .unwrap();

        let record = LogRecord::new(LogLevel::Info, "ignored", "GET {}")
            .with_location("server.rs", 12, "svc::http")
            .with_arg("/health");
        ctx.logger("svc.access").log_record(record);

        let parsed: serde_json::Value = serde_json::from_str(buffer.lines()[0].as_str()).unwrap();
        assert_eq!(parsed["message"], "GET /health");
        assert_eq!(parsed["logger"], "svc.access");
        assert_eq!(parsed["lineno"], 12);
    }
}
