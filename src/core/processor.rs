//! Record enrichment processors
//!
//! A [`ProcessorChain`] is an ordered list of [`Processor`] steps. Each step
//! receives the event dictionary produced by the previous one and returns the
//! next, or `None` to drop the event. Steps may read the original
//! [`LogRecord`] through the [`ProcessScope`], so location metadata is
//! available no matter where a step sits in the chain.

use super::event_dict::{EventDict, FieldValue};
use super::log_level::LogLevel;
use super::log_record::{sanitize, LogRecord};
use super::timestamp::TimestampFormat;
use std::fmt;
use std::sync::Arc;

/// What a step can see besides the event itself
#[derive(Debug, Clone, Copy)]
pub struct ProcessScope<'a> {
    pub record: &'a LogRecord,
    /// Effective threshold of the originating logger
    pub threshold: LogLevel,
}

impl<'a> ProcessScope<'a> {
    pub fn new(record: &'a LogRecord, threshold: LogLevel) -> Self {
        Self { record, threshold }
    }
}

pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transform the event, or return `None` to drop it.
    fn process(&self, scope: &ProcessScope<'_>, event: EventDict) -> Option<EventDict>;
}

/// Add the line number to the event dict.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddLineNo;

impl Processor for AddLineNo {
    fn name(&self) -> &'static str {
        "add_line_no"
    }

    fn process(&self, scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        if let Some(line) = scope.record.line {
            event.insert("lineno", line);
        }
        Some(event)
    }
}

/// Add the file name to the event dict.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddFileName;

impl Processor for AddFileName {
    fn name(&self) -> &'static str {
        "add_file_name"
    }

    fn process(&self, scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        if let Some(filename) = scope.record.filename() {
            event.insert("filename", filename);
        }
        Some(event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AddLoggerName;

impl Processor for AddLoggerName {
    fn name(&self) -> &'static str {
        "add_logger_name"
    }

    fn process(&self, scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        event.insert("logger", scope.record.logger.as_str());
        Some(event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AddLogLevel;

impl Processor for AddLogLevel {
    fn name(&self) -> &'static str {
        "add_log_level"
    }

    fn process(&self, scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        event.insert("level", scope.record.level.as_field());
        Some(event)
    }
}

/// Fill `{}` placeholders in `message` from the record's positional arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalArgumentsFormatter;

impl Processor for PositionalArgumentsFormatter {
    fn name(&self) -> &'static str {
        "positional_arguments_formatter"
    }

    fn process(&self, scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        if scope.record.args.is_empty() {
            return Some(event);
        }
        if let Some(FieldValue::String(template)) = event.get("message") {
            let message = interpolate(template, &scope.record.args);
            event.insert("message", message);
        }
        Some(event)
    }
}

/// Substitute positional arguments into a `{}` template.
///
/// `{{` and `}}` produce literal braces. Placeholders without a matching
/// argument are kept verbatim and surplus arguments are ignored.
pub fn interpolate(template: &str, args: &[FieldValue]) -> String {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

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
            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(arg) => out.push_str(&sanitize(&arg.to_string())),
                    None => out.push_str("{}"),
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StackInfoRenderer;

impl Processor for StackInfoRenderer {
    fn name(&self) -> &'static str {
        "stack_info_renderer"
    }

    fn process(&self, scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        if let Some(stack) = &scope.record.stack_info {
            event.insert("stack", stack.as_str());
        }
        Some(event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormatExcInfo;

impl Processor for FormatExcInfo {
    fn name(&self) -> &'static str {
        "format_exc_info"
    }

    fn process(&self, scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        if let Some(info) = &scope.record.exc_info {
            event.insert("exception", info.render());
        }
        Some(event)
    }
}

/// Decode byte values as UTF-8 so renderers only ever see text
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeDecoder;

impl UnicodeDecoder {
    fn decode(value: &mut FieldValue) {
        match value {
            FieldValue::Bytes(bytes) => {
                *value = FieldValue::String(String::from_utf8_lossy(bytes).into_owned());
            }
            FieldValue::List(items) => items.iter_mut().for_each(Self::decode),
            FieldValue::Map(map) => map.values_mut().for_each(Self::decode),
            _ => {}
        }
    }
}

impl Processor for UnicodeDecoder {
    fn name(&self) -> &'static str {
        "unicode_decoder"
    }

    fn process(&self, _scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        event.values_mut().for_each(Self::decode);
        Some(event)
    }
}

/// Drop events below the originating logger's threshold
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterByLevel;

impl Processor for FilterByLevel {
    fn name(&self) -> &'static str {
        "filter_by_level"
    }

    fn process(&self, scope: &ProcessScope<'_>, event: EventDict) -> Option<EventDict> {
        scope
            .threshold
            .admits(scope.record.level)
            .then_some(event)
    }
}

/// Package the event for the structured formatter.
///
/// Keys starting with `_` are internal to the chain and never rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapForFormatter;

impl Processor for WrapForFormatter {
    fn name(&self) -> &'static str {
        "wrap_for_formatter"
    }

    fn process(&self, _scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        event.retain(|key, _| !key.starts_with('_'));
        Some(event)
    }
}

/// Add the record's creation time as `timestamp`
#[derive(Debug, Clone, Default)]
pub struct TimeStamper {
    format: TimestampFormat,
}

impl TimeStamper {
    pub fn new(format: TimestampFormat) -> Self {
        Self { format }
    }
}

impl Processor for TimeStamper {
    fn name(&self) -> &'static str {
        "timestamper"
    }

    fn process(&self, scope: &ProcessScope<'_>, mut event: EventDict) -> Option<EventDict> {
        let value = match self.format.numeric_value(&scope.record.timestamp) {
            Some(n) => FieldValue::Int(n),
            None => FieldValue::String(self.format.format(&scope.record.timestamp)),
        };
        event.insert("timestamp", value);
        Some(event)
    }
}

/// Ordered sequence of enrichment steps
#[derive(Clone, Default)]
pub struct ProcessorChain {
    steps: Vec<Arc<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Enrichment steps shared by both formats.
    ///
    /// The two location steps come first because they read the original
    /// record, not anything added by later steps.
    pub fn pre_chain() -> Self {
        Self::new()
            .with(AddLineNo)
            .with(AddFileName)
            .with(AddLoggerName)
            .with(AddLogLevel)
            .with(PositionalArgumentsFormatter)
            .with(StackInfoRenderer)
            .with(FormatExcInfo)
            .with(UnicodeDecoder)
    }

    /// Chain used with the text formatter
    pub fn text() -> Self {
        Self::pre_chain()
    }

    /// Chain used with the structured formatter: level filter, pre-chain, packaging
    pub fn structured() -> Self {
        let mut chain = Self::new().with(FilterByLevel);
        chain.steps.extend(Self::pre_chain().steps);
        chain.with(WrapForFormatter)
    }

    /// Append a step
    #[must_use]
    pub fn with<P: Processor + 'static>(mut self, step: P) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Add a step ahead of a trailing `wrap_for_formatter`, or at the end.
    pub fn push_before_wrap(&mut self, step: Arc<dyn Processor>) {
        let at = match self.steps.last() {
            Some(last) if last.name() == WrapForFormatter.name() => self.steps.len() - 1,
            _ => self.steps.len(),
        };
        self.steps.insert(at, step);
    }

    pub fn push(&mut self, step: Arc<dyn Processor>) {
        self.steps.push(step);
    }

    /// Step names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order; `None` if a step dropped the event.
    pub fn run(&self, scope: &ProcessScope<'_>, event: EventDict) -> Option<EventDict> {
        self.steps
            .iter()
            .try_fold(event, |event, step| step.process(scope, event))
    }
}

impl fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
