//! Log record structure

use super::event_dict::{EventDict, FieldValue};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error;
use std::panic::Location;
use std::path::Path;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Sanitize text to prevent log injection attacks
///
/// Replaces newlines, carriage returns, and tabs with escape sequences
/// to prevent attackers from injecting fake log entries.
pub(crate) fn sanitize(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Error details attached to a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionInfo {
    /// Type name of the error value
    pub type_name: String,
    pub message: String,
    /// Messages of the `source()` chain, outermost first
    pub causes: Vec<String>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Capture an error value and its source chain
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + ?Sized,
    {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            causes,
        }
    }

    /// Multi-line rendering used for the `exception` field
    pub fn render(&self) -> String {
        let mut out = format!("{}: {}", self.type_name, self.message);
        for cause in &self.causes {
            out.push_str("\nCaused by: ");
            out.push_str(cause);
        }
        out
    }
}

/// A record as captured at the call site, before any enrichment
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    /// Name of the originating logger
    pub logger: String,
    /// Message template; `{}` placeholders are filled from `args`
    pub message: String,
    pub args: Vec<FieldValue>,
    /// Extra key/value fields supplied with the call
    pub fields: EventDict,
    pub timestamp: DateTime<Utc>,
    pub file: Option<String>,
    pub function: Option<String>,
    pub line: Option<u32>,
    pub module_path: Option<String>,
    pub thread_id: String,
    pub thread_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exc_info: Option<ExceptionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_info: Option<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, logger: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self {
            level,
            logger: logger.into(),
            message: sanitize(message.as_ref()),
            args: Vec::new(),
            fields: EventDict::new(),
            timestamp: Utc::now(),
            file: None,
            function: None,
            line: None,
            module_path: None,
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            exc_info: None,
            stack_info: None,
        }
    }

    pub fn with_location(mut self, file: &str, line: u32, module_path: &str) -> Self {
        self.file = Some(file.to_string());
        self.line = Some(line);
        self.module_path = Some(module_path.to_string());
        self
    }

    /// File and line of a `#[track_caller]` call site
    pub fn with_caller(mut self, location: &Location<'_>) -> Self {
        self.file = Some(location.file().to_string());
        self.line = Some(location.line());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_args(mut self, args: Vec<FieldValue>) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, arg: impl Into<FieldValue>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key, value);
        self
    }

    pub fn with_fields(mut self, fields: EventDict) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_exception<E>(mut self, err: &E) -> Self
    where
        E: Error + ?Sized,
    {
        self.exc_info = Some(ExceptionInfo::from_error(err));
        self
    }

    pub fn with_exc_info(mut self, info: ExceptionInfo) -> Self {
        self.exc_info = Some(info);
        self
    }

    /// Capture the current stack for the `stack` field
    pub fn with_stack_info(mut self) -> Self {
        self.stack_info = Some(Backtrace::force_capture().to_string());
        self
    }

    /// Base name of the source file, if known
    pub fn filename(&self) -> Option<&str> {
        self.file.as_deref().map(|file| {
            Path::new(file)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(file)
        })
    }

    /// The event dictionary the processor chain starts from
    pub fn initial_event(&self) -> EventDict {
        let mut event = self.fields.clone();
        event.insert("message", self.message.as_str());
        event
    }
}
