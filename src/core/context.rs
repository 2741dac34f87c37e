//! Logging context
//!
//! A [`LoggingContext`] owns the logger registry, the active processor chain
//! and the installed handler. It is cheap to clone; every clone refers to the
//! same pipeline.

use super::config::{LogFormat, LoggingConfig};
use super::error::Result;
use super::event_dict::EventDict;
use super::formatter::{StructuredFormatter, TextFormatter};
use super::handler::Handler;
use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::logger::Logger;
use super::metrics::LoggingMetrics;
use super::processor::{ProcessScope, ProcessorChain, TimeStamper};
use super::registry::{LoggerNode, LoggerRegistry};
use super::verbosity::Verbosity;
use crate::handlers::StreamHandler;
use parking_lot::RwLock;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Pipeline pieces replaced as a whole on every reconfiguration
struct PipelineState {
    format: LogFormat,
    verbosity: Verbosity,
    chain: Arc<ProcessorChain>,
    handler: Option<Arc<dyn Handler>>,
    override_logs: Vec<String>,
    suppressed_logs: Vec<String>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            verbosity: Verbosity::Warning,
            chain: Arc::new(ProcessorChain::text()),
            handler: None,
            override_logs: Vec::new(),
            suppressed_logs: Vec::new(),
        }
    }
}

struct Inner {
    registry: LoggerRegistry,
    state: RwLock<PipelineState>,
    metrics: LoggingMetrics,
}

/// Handle to one configured logging pipeline
///
/// ```
/// use rust_logging_config::prelude::*;
/// use rust_logging_config::handlers::{SharedBuffer, Sink};
///
/// let buffer = SharedBuffer::new();
/// let ctx = LoggingConfig::builder()
///     .verbosity(Verbosity::Info)
///     .sink(Sink::Buffer(buffer.clone()))
///     .configure()
///     .unwrap();
///
/// ctx.logger("app").info("ready");
/// assert!(buffer.contents().ends_with("] ready\n"));
/// ```
#[derive(Clone)]
pub struct LoggingContext {
    inner: Arc<Inner>,
}

impl LoggingContext {
    /// An unconfigured context: root threshold `Warning`, no handlers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: LoggerRegistry::new(),
                state: RwLock::new(PipelineState::default()),
                metrics: LoggingMetrics::new(),
            }),
        }
    }

    /// Install `config`, replacing whatever was configured before.
    ///
    /// Loggers touched by the previous configuration (overridden or
    /// suppressed) lose their handlers and thresholds first, so the result
    /// matches configuring a fresh context. Thresholds of loggers no
    /// configuration named are left alone. Handler lists are swapped in one
    /// step, so concurrent records always see either the old or the new
    /// handler.
    pub fn reconfigure(&self, config: &LoggingConfig) -> Result<()> {
        config.validate()?;

        let level = config.level();
        let chain = Self::build_chain(config);
        let handler = Self::build_handler(config, level);

        let override_logs = match config.format {
            LogFormat::Text => Vec::new(),
            LogFormat::Structured => config.override_logs.clone(),
        };
        let suppressed_logs = if config.suppresses_external() {
            config.external_logs.clone()
        } else {
            Vec::new()
        };

        let mut state = self.inner.state.write();
        let registry = &self.inner.registry;

        for name in &state.override_logs {
            if override_logs.contains(name) {
                continue;
            }
            if let Some(node) = registry.existing(name) {
                node.clear_handlers();
                node.clear_level();
            }
        }
        for name in &state.suppressed_logs {
            if suppressed_logs.contains(name) || override_logs.contains(name) {
                continue;
            }
            if let Some(node) = registry.existing(name) {
                node.clear_level();
            }
        }

        let root = registry.root();
        root.replace_handlers(vec![Arc::clone(&handler)]);
        root.set_level(level);

        for name in &override_logs {
            let node = registry.get(name);
            node.replace_handlers(vec![Arc::clone(&handler)]);
            node.set_level(level);
        }

        for name in &suppressed_logs {
            registry.get(name).set_level(LogLevel::Warning);
        }

        *state = PipelineState {
            format: config.format,
            verbosity: config.verbosity,
            chain: Arc::new(chain),
            handler: Some(handler),
            override_logs,
            suppressed_logs,
        };

        Ok(())
    }

    fn build_chain(config: &LoggingConfig) -> ProcessorChain {
        let mut chain = match config.format {
            LogFormat::Text => ProcessorChain::text(),
            LogFormat::Structured => ProcessorChain::structured(),
        };
        if let Some(format) = &config.timestamps {
            chain.push_before_wrap(Arc::new(TimeStamper::new(format.clone())));
        }
        chain
    }

    fn build_handler(config: &LoggingConfig, level: LogLevel) -> Arc<dyn Handler> {
        let handler = match config.format {
            LogFormat::Text => StreamHandler::from_sink(
                &config.sink,
                TextFormatter::new().with_colors(config.colors),
            ),
            LogFormat::Structured => {
                let mut foreign_pre_chain = ProcessorChain::pre_chain();
                if let Some(format) = &config.timestamps {
                    foreign_pre_chain.push(Arc::new(TimeStamper::new(format.clone())));
                }
                StreamHandler::from_sink(&config.sink, StructuredFormatter::new(foreign_pre_chain))
            }
        };
        Arc::new(handler.with_level(level))
    }

    /// Logger handle for `name`; `""` and `"root"` name the root logger.
    pub fn logger(&self, name: impl Into<String>) -> Logger {
        Logger::new(name, self.clone())
    }

    pub fn root_logger(&self) -> Logger {
        self.logger(super::registry::ROOT_LOGGER_NAME)
    }

    pub fn registry(&self) -> &LoggerRegistry {
        &self.inner.registry
    }

    /// Registry node for `name`, created on first use
    pub fn node(&self, name: &str) -> Arc<LoggerNode> {
        self.inner.registry.get(name)
    }

    pub fn metrics(&self) -> &LoggingMetrics {
        &self.inner.metrics
    }

    pub fn format(&self) -> LogFormat {
        self.inner.state.read().format
    }

    pub fn verbosity(&self) -> Verbosity {
        self.inner.state.read().verbosity
    }

    /// Threshold currently set on the root logger
    pub fn level(&self) -> LogLevel {
        self.inner.registry.effective_level(super::registry::ROOT_LOGGER_NAME)
    }

    /// The processor chain records go through
    pub fn chain(&self) -> Arc<ProcessorChain> {
        Arc::clone(&self.inner.state.read().chain)
    }

    /// The handler installed by the last configuration
    pub fn handler(&self) -> Option<Arc<dyn Handler>> {
        self.inner.state.read().handler.clone()
    }

    pub fn is_enabled_for(&self, logger: &str, level: LogLevel) -> bool {
        self.inner.registry.effective_level(logger).admits(level)
    }

    /// Flush every handler reachable from the root and the named loggers.
    pub fn flush(&self) -> Result<()> {
        let registry = &self.inner.registry;
        let mut handlers = registry.handlers_for(super::registry::ROOT_LOGGER_NAME);
        for name in registry.names() {
            for handler in registry.handlers_for(&name) {
                if !handlers
                    .iter()
                    .any(|h| super::handler::same_handler(h, &handler))
                {
                    handlers.push(handler);
                }
            }
        }

        for handler in handlers {
            handler.flush()?;
        }
        Ok(())
    }

    /// Run a record through the chain and hand it to the handlers.
    pub(crate) fn emit(&self, record: LogRecord) {
        let threshold = self.inner.registry.effective_level(&record.logger);
        if !threshold.admits(record.level) {
            self.inner.metrics.record_filtered();
            return;
        }

        let chain = self.chain();
        let scope = ProcessScope::new(&record, threshold);
        match chain.run(&scope, record.initial_event()) {
            Some(event) => self.dispatch(&record, Some(&event)),
            None => {
                self.inner.metrics.record_filtered();
            }
        }
    }

    /// Hand a record to the handlers without running the chain.
    pub(crate) fn emit_foreign(&self, record: LogRecord) {
        if !self.is_enabled_for(&record.logger, record.level) {
            self.inner.metrics.record_filtered();
            return;
        }
        self.dispatch(&record, None);
    }

    /// Offer a record to every handler on its path, isolating failures.
    fn dispatch(&self, record: &LogRecord, event: Option<&EventDict>) {
        let metrics = &self.inner.metrics;
        let handlers = self.inner.registry.handlers_for(&record.logger);
        if handlers.is_empty() {
            metrics.record_dropped();
            return;
        }

        let mut delivered = 0usize;
        let mut failed = 0usize;

        for handler in &handlers {
            if !handler.level().admits(record.level) {
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(record, event)));

            match result {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Handler '{}' failed: {}", handler.name(), e);
                    metrics.record_handler_error();
                    failed += 1;
                }
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    eprintln!(
                        "[LOGGER CRITICAL] Handler '{}' panicked: {}. \
                         Other handlers continue to function.",
                        handler.name(),
                        panic_msg
                    );
                    metrics.record_handler_error();
                    failed += 1;
                }
            }
        }

        if delivered > 0 && failed == 0 {
            metrics.record_emitted();
        } else if failed > 0 {
            metrics.record_dropped();
        } else {
            metrics.record_filtered();
        }
    }
}

impl Default for LoggingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("LoggingContext")
            .field("format", &state.format)
            .field("verbosity", &state.verbosity)
            .field("chain", &*state.chain)
            .field("registry", &self.inner.registry)
            .finish()
    }
}
