//! Error types for the logging configuration layer

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Log format selector that is not one of the supported formats
    #[error("Unsupported log format '{value}': expected one of text, json, structured")]
    UnsupportedFormat { value: String },

    /// Verbosity that is neither a known name nor a non-negative ordinal
    #[error("Unsupported verbosity '{value}'")]
    UnsupportedVerbosity { value: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),
}

impl LoggerError {
    /// Create an unsupported format error
    pub fn unsupported_format(value: impl Into<String>) -> Self {
        LoggerError::UnsupportedFormat {
            value: value.into(),
        }
    }

    /// Create an unsupported verbosity error
    pub fn unsupported_verbosity(value: impl Into<String>) -> Self {
        LoggerError::UnsupportedVerbosity {
            value: value.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}
