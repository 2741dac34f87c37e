//! Record formatters
//!
//! - [`TextFormatter`]: one human-readable line per record from a fixed template
//! - [`StructuredFormatter`]: one JSON object per record with every event field

use super::error::Result;
use super::event_dict::EventDict;
use super::log_record::LogRecord;
use super::processor::{interpolate, ProcessScope, Processor, ProcessorChain, WrapForFormatter};
use std::borrow::Cow;

/// Template used by the text format.
///
/// Consumers parsing text logs depend on this exact shape.
pub const TEXT_LOG_FORMAT: &str = "[{levelname} {filename}:{funcName}:{lineno}] {message}";

const UNKNOWN: &str = "?";

/// Turns a record into a single rendered string
///
/// `event` is `None` for foreign records that bypassed the processor chain.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord, event: Option<&EventDict>) -> Result<String>;
    fn name(&self) -> &str;
}

/// Renders records through a `{field}` template
///
/// Recognised placeholders are `levelname`, `filename`, `funcName`, `lineno`,
/// `message`, `name`, `module` and `threadName`; any other name is looked up
/// in the event fields. `{{` and `}}` are literal braces.
#[derive(Debug, Clone)]
pub struct TextFormatter {
    template: String,
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    use_colors: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self {
            template: TEXT_LOG_FORMAT.to_string(),
            use_colors: false,
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Colour the level name. Has no effect without the `console` feature.
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn level_name(&self, record: &LogRecord) -> String {
        #[cfg(feature = "console")]
        if self.use_colors {
            use colored::Colorize;
            return record
                .level
                .to_str()
                .color(record.level.color_code())
                .to_string();
        }
        record.level.to_str().to_string()
    }

    fn lookup<'a>(
        &self,
        key: &str,
        record: &'a LogRecord,
        event: Option<&'a EventDict>,
        message: &'a str,
    ) -> Cow<'a, str> {
        match key {
            "levelname" => Cow::Owned(self.level_name(record)),
            "filename" => Cow::Borrowed(record.filename().unwrap_or(UNKNOWN)),
            "funcName" => Cow::Borrowed(record.function.as_deref().unwrap_or(UNKNOWN)),
            "lineno" => Cow::Owned(record.line.unwrap_or(0).to_string()),
            "message" => Cow::Borrowed(message),
            "name" => Cow::Borrowed(record.logger.as_str()),
            "module" => Cow::Borrowed(record.module_path.as_deref().unwrap_or(UNKNOWN)),
            "threadName" => Cow::Borrowed(
                record
                    .thread_name
                    .as_deref()
                    .unwrap_or(record.thread_id.as_str()),
            ),
            other => event
                .and_then(|event| event.get(other))
                .or_else(|| record.fields.get(other))
                .map(|value| Cow::Owned(value.to_string()))
                .unwrap_or(Cow::Borrowed("-")),
        }
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &LogRecord, event: Option<&EventDict>) -> Result<String> {
        let message: Cow<'_, str> = match event.and_then(|event| event.get("message")) {
            Some(value) => Cow::Owned(value.to_string()),
            None => Cow::Owned(interpolate(&record.message, &record.args)),
        };

        let mut out = String::with_capacity(self.template.len() + message.len() + 32);
        let mut chars = self.template.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, chars.peek().copied()) {
                ('{', Some('{')) => {
                    chars.next();
                    out.push('{');
                }
                ('}', Some('}')) => {
                    chars.next();
                    out.push('}');
                }
                ('{', _) => {
                    let key: String = chars.by_ref().take_while(|&c| c != '}').collect();
                    out.push_str(&self.lookup(&key, record, event, &message));
                }
                _ => out.push(c),
            }
        }

        if let Some(info) = &record.exc_info {
            out.push('\n');
            out.push_str(&info.render());
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// Renders every event field as a member of a single-line JSON object
///
/// Foreign records are enriched with `foreign_pre_chain` first so they carry
/// the same fields as records that went through the configured chain.
#[derive(Debug, Clone)]
pub struct StructuredFormatter {
    foreign_pre_chain: ProcessorChain,
}

impl StructuredFormatter {
    pub fn new(foreign_pre_chain: ProcessorChain) -> Self {
        Self { foreign_pre_chain }
    }

    pub fn foreign_pre_chain(&self) -> &ProcessorChain {
        &self.foreign_pre_chain
    }

    fn enrich_foreign(&self, record: &LogRecord) -> EventDict {
        let scope = ProcessScope::new(record, record.level);
        let initial = record.initial_event();
        let event = self
            .foreign_pre_chain
            .run(&scope, initial.clone())
            .unwrap_or(initial);
        WrapForFormatter.process(&scope, event.clone()).unwrap_or(event)
    }
}

impl Default for StructuredFormatter {
    fn default() -> Self {
        Self::new(ProcessorChain::pre_chain())
    }
}

impl Formatter for StructuredFormatter {
    fn format(&self, record: &LogRecord, event: Option<&EventDict>) -> Result<String> {
        let event = match event {
            Some(event) => Cow::Borrowed(event),
            None => Cow::Owned(self.enrich_foreign(record)),
        };

        let value = serde_json::Value::Object(event.to_json_map());
        Ok(serde_json::to_string(&value)?)
    }

    fn name(&self) -> &str {
        "json"
    }
}
