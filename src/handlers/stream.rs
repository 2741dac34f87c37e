//! Stream handler implementation

use crate::core::{EventDict, Formatter, Handler, LogLevel, LogRecord, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// In-memory sink that can be cloned and inspected
///
/// Every clone writes to the same buffer.
///
/// ```
/// use rust_logging_config::handlers::SharedBuffer;
/// use std::io::Write;
///
/// let buffer = SharedBuffer::new();
/// let mut writer = buffer.clone();
/// writeln!(writer, "first").unwrap();
///
/// assert_eq!(buffer.lines(), vec!["first".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Where a [`StreamHandler`] writes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sink {
    #[default]
    Stdout,
    Stderr,
    /// In-memory buffer; not available from serialized configuration
    #[serde(skip)]
    Buffer(SharedBuffer),
}

impl Sink {
    fn open(&self) -> Box<dyn Write + Send> {
        match self {
            Sink::Stdout => Box::new(io::stdout()),
            Sink::Stderr => Box::new(io::stderr()),
            Sink::Buffer(buffer) => Box::new(buffer.clone()),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Sink::Stdout => "stdout",
            Sink::Stderr => "stderr",
            Sink::Buffer(_) => "buffer",
        }
    }
}

/// Writes each formatted record as one line to a stream
///
/// Writes are serialised by an internal lock, so concurrent records never
/// interleave within a line. The stream is flushed after every record.
pub struct StreamHandler {
    name: String,
    level: RwLock<LogLevel>,
    formatter: Box<dyn Formatter>,
    stream: Mutex<Box<dyn Write + Send>>,
}

impl StreamHandler {
    pub fn new<F>(name: impl Into<String>, stream: Box<dyn Write + Send>, formatter: F) -> Self
    where
        F: Formatter + 'static,
    {
        Self {
            name: name.into(),
            level: RwLock::new(LogLevel::Debug),
            formatter: Box::new(formatter),
            stream: Mutex::new(stream),
        }
    }

    pub fn from_sink<F>(sink: &Sink, formatter: F) -> Self
    where
        F: Formatter + 'static,
    {
        let name = format!("{}:{}", sink.label(), formatter.name());
        Self::new(name, sink.open(), formatter)
    }

    pub fn stdout<F: Formatter + 'static>(formatter: F) -> Self {
        Self::from_sink(&Sink::Stdout, formatter)
    }

    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        *self.level.write() = level;
        self
    }

    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }
}

impl fmt::Debug for StreamHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandler")
            .field("name", &self.name)
            .field("level", &*self.level.read())
            .field("formatter", &self.formatter.name())
            .finish()
    }
}

impl Handler for StreamHandler {
    fn handle(&self, record: &LogRecord, event: Option<&EventDict>) -> Result<()> {
        let line = self.formatter.format(record, event)?;

        let mut stream = self.stream.lock();
        writeln!(stream, "{}", line)?;
        stream.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.stream.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> LogLevel {
        *self.level.read()
    }

    fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }
}
