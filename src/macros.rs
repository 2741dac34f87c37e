//! Logging macros that capture the call site.
//!
//! Each macro records `file!()`, `line!()`, `module_path!()` and the name of
//! the enclosing function, so text output shows the real location. Positional
//! arguments fill the `{}` placeholders of the message; extra key/value
//! fields follow a `;`.
//!
//! # Examples
//!
//! ```
//! use rust_logging_config::prelude::*;
//! use rust_logging_config::info;
//!
//! let ctx = default_logging(Verbosity::Info, LogFormat::Text, &[], &[]).unwrap();
//! let logger = ctx.logger("app");
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With positional arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With extra fields
//! info!(logger, "User {} logged in", "bob"; attempt = 2, remote = "10.0.0.1");
//! ```

/// Name of the enclosing function, without its module path.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        let name = name.strip_suffix("::__here").unwrap_or(name);
        let name = name.trim_end_matches("::{{closure}}");
        match name.rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }};
}

/// Log a message at the given level.
///
/// # Examples
///
/// ```
/// # use rust_logging_config::prelude::*;
/// # let ctx = default_logging(Verbosity::Debug, LogFormat::Text, &[], &[]).unwrap();
/// # let logger = ctx.logger("app");
/// use rust_logging_config::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr $(, $arg:expr)* $(,)? $(; $($key:ident = $value:expr),+ $(,)?)?) => {{
        let __logger = &$logger;
        let __level: $crate::LogLevel = $level;
        if __logger.is_enabled_for(__level) {
            __logger.emit(
                $crate::LogRecord::new(__level, __logger.name(), $msg)
                    .with_location(file!(), line!(), module_path!())
                    .with_function($crate::__function_name!())
                    $(.with_arg($arg))*
                    $($(.with_field(stringify!($key), $value))+)?,
            );
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_logging_config::prelude::*;
/// # let ctx = default_logging(Verbosity::Debug, LogFormat::Text, &[], &[]).unwrap();
/// # let logger = ctx.logger("app");
/// use rust_logging_config::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_logging_config::prelude::*;
/// # let ctx = default_logging(Verbosity::Warning, LogFormat::Text, &[], &[]).unwrap();
/// # let logger = ctx.logger("app");
/// use rust_logging_config::warning;
/// warning!(logger, "Disk usage at {}%", 91; mount = "/var");
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}
