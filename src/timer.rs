//! Call timing
//!
//! [`CallTimer`] measures one invocation of a callable with a monotonic
//! [`Clock`] and reports it as a single `"function timing"` event through a
//! [`LogFacade`]. The wrapped call's value, error or panic is passed back
//! unchanged.
//!
//! ```
//! use rust_logging_config::prelude::*;
//! use rust_logging_config::handlers::{SharedBuffer, Sink};
//!
//! let buffer = SharedBuffer::new();
//! let ctx = LoggingConfig::builder()
//!     .verbosity(Verbosity::Info)
//!     .format(LogFormat::Structured)
//!     .sink(Sink::Buffer(buffer.clone()))
//!     .configure()
//!     .unwrap();
//!
//! let timer = CallTimer::new(ctx.logger("perf"), true);
//! let sum = timer.call_detailed("add", (1, 2), |(a, b)| a + b);
//!
//! assert_eq!(sum, 3);
//! assert!(buffer.contents().contains(r#""function":"add""#));
//! ```

use crate::core::{EventDict, FieldValue, LogLevel, Logger};
use parking_lot::Mutex;
use serde::Serialize;
use std::any::type_name;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Message of every timing event
pub const TIMING_MESSAGE: &str = "function timing";

/// Minimal logging surface the timer needs
pub trait LogFacade {
    fn log_event(&self, level: LogLevel, message: &str, fields: EventDict);
}

impl LogFacade for Logger {
    fn log_event(&self, level: LogLevel, message: &str, fields: EventDict) {
        self.log_with_fields(level, message, fields);
    }
}

impl<T: LogFacade + ?Sized> LogFacade for &T {
    fn log_event(&self, level: LogLevel, message: &str, fields: EventDict) {
        (**self).log_event(level, message, fields);
    }
}

impl<T: LogFacade + ?Sized> LogFacade for Arc<T> {
    fn log_event(&self, level: LogLevel, message: &str, fields: EventDict) {
        (**self).log_event(level, message, fields);
    }
}

impl<T: LogFacade + ?Sized> LogFacade for Box<T> {
    fn log_event(&self, level: LogLevel, message: &str, fields: EventDict) {
        (**self).log_event(level, message, fields);
    }
}

/// Source of monotonic time, as an offset from an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

/// [`Instant`]-backed clock
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
///
/// ```
/// use rust_logging_config::timer::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(clock.now(), Duration::from_millis(250));
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: Duration) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measured invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRecord {
    pub function: String,
    /// Clock reading at entry
    pub start: Duration,
    pub duration: Duration,
    pub args: Option<FieldValue>,
    /// Only set for successful calls with details enabled
    pub result: Option<FieldValue>,
    pub outcome: Outcome,
}

impl TimingRecord {
    pub fn into_event(self) -> EventDict {
        let mut event = EventDict::new()
            .with_field("function", self.function)
            .with_field("duration", self.duration.as_secs_f64())
            .with_field("outcome", self.outcome.as_str());
        if let Some(args) = self.args {
            event.insert("args", args);
        }
        if let Some(result) = self.result {
            event.insert("result", result);
        }
        event
    }
}

/// Serialize `value` into a field, falling back to a placeholder string.
pub fn capture<T: Serialize + ?Sized>(value: &T) -> FieldValue {
    match serde_json::to_value(value) {
        Ok(value) => FieldValue::from(value),
        Err(e) => FieldValue::String(format!("<unserializable: {}>", e)),
    }
}

fn outcome_of<T, E>(result: &Result<T, E>) -> Outcome {
    match result {
        Ok(_) => Outcome::Success,
        Err(_) => Outcome::Error,
    }
}

/// Times calls and reports each one through a [`LogFacade`]
///
/// Any callable can be timed with [`call`](Self::call) and
/// [`wrap`](Self::wrap). The `*_detailed` variants additionally need
/// `Serialize` arguments and results, and record them when `details` is set.
pub struct CallTimer<L, C = MonotonicClock> {
    facade: L,
    clock: C,
    details: bool,
}

impl<L: LogFacade> CallTimer<L, MonotonicClock> {
    /// With `details`, the `*_detailed` entry points also record arguments and result.
    pub fn new(facade: L, details: bool) -> Self {
        Self::with_clock(facade, details, MonotonicClock::new())
    }
}

impl<L: LogFacade, C: Clock> CallTimer<L, C> {
    pub fn with_clock(facade: L, details: bool, clock: C) -> Self {
        Self {
            facade,
            clock,
            details,
        }
    }

    pub fn details(&self) -> bool {
        self.details
    }

    pub fn facade(&self) -> &L {
        &self.facade
    }

    /// Invoke `f(args)` once and report its duration.
    ///
    /// Multiple arguments are passed as a tuple. A panic in `f` is reported
    /// as an `error` outcome and then resumed. Arguments and result are never
    /// recorded here; see [`call_detailed`](Self::call_detailed).
    pub fn call<A, R, F>(&self, function: &str, args: A, f: F) -> R
    where
        F: FnOnce(A) -> R,
    {
        self.time(function, args, f, |_| None, |_| (Outcome::Success, None))
    }

    /// As [`call`](Self::call), also recording `args` and the returned value
    /// when the timer was built with details.
    pub fn call_detailed<A, R, F>(&self, function: &str, args: A, f: F) -> R
    where
        A: Serialize,
        R: Serialize,
        F: FnOnce(A) -> R,
    {
        let details = self.details;
        self.time(
            function,
            args,
            f,
            |args| details.then(|| capture(args)),
            |value| (Outcome::Success, details.then(|| capture(value))),
        )
    }

    /// As [`call`](Self::call) for fallible functions; `Err` is the error outcome.
    pub fn call_fallible<A, T, E, F>(&self, function: &str, args: A, f: F) -> Result<T, E>
    where
        F: FnOnce(A) -> Result<T, E>,
    {
        self.time(function, args, f, |_| None, |result| (outcome_of(result), None))
    }

    /// As [`call_fallible`](Self::call_fallible), also recording `args` and
    /// the `Ok` value when the timer was built with details.
    pub fn call_fallible_detailed<A, T, E, F>(
        &self,
        function: &str,
        args: A,
        f: F,
    ) -> Result<T, E>
    where
        A: Serialize,
        T: Serialize,
        F: FnOnce(A) -> Result<T, E>,
    {
        let details = self.details;
        self.time(
            function,
            args,
            f,
            |args| details.then(|| capture(args)),
            |result| match result {
                Ok(value) => (Outcome::Success, details.then(|| capture(value))),
                Err(_) => (Outcome::Error, None),
            },
        )
    }

    /// Time every invocation of `f`, identified by its type name.
    pub fn wrap<'a, A, R, F>(&'a self, f: F) -> impl Fn(A) -> R + 'a
    where
        F: Fn(A) -> R + 'a,
    {
        self.wrap_named(type_name::<F>(), f)
    }

    /// Time every invocation of `f` under `function`.
    pub fn wrap_named<'a, A, R, F>(
        &'a self,
        function: impl Into<String>,
        f: F,
    ) -> impl Fn(A) -> R + 'a
    where
        F: Fn(A) -> R + 'a,
    {
        let function = function.into();
        move |args| self.call(&function, args, &f)
    }

    /// As [`wrap_named`](Self::wrap_named) through [`call_detailed`](Self::call_detailed).
    pub fn wrap_detailed<'a, A, R, F>(
        &'a self,
        function: impl Into<String>,
        f: F,
    ) -> impl Fn(A) -> R + 'a
    where
        A: Serialize,
        R: Serialize,
        F: Fn(A) -> R + 'a,
    {
        let function = function.into();
        move |args| self.call_detailed(&function, args, &f)
    }

    fn time<A, R, F, CA, CR>(
        &self,
        function: &str,
        args: A,
        f: F,
        capture_args: CA,
        inspect: CR,
    ) -> R
    where
        F: FnOnce(A) -> R,
        CA: FnOnce(&A) -> Option<FieldValue>,
        CR: FnOnce(&R) -> (Outcome, Option<FieldValue>),
    {
        let captured_args = capture_args(&args);

        let start = self.clock.now();
        let returned = panic::catch_unwind(AssertUnwindSafe(|| f(args)));
        let duration = self.clock.now().saturating_sub(start);

        let mut record = TimingRecord {
            function: function.to_string(),
            start,
            duration,
            args: captured_args,
            result: None,
            outcome: Outcome::Error,
        };

        match returned {
            Ok(value) => {
                let (outcome, result) = inspect(&value);
                record.outcome = outcome;
                record.result = result;
                self.report(record);
                value
            }
            Err(payload) => {
                self.report(record);
                panic::resume_unwind(payload)
            }
        }
    }

    fn report(&self, record: TimingRecord) {
        self.facade
            .log_event(LogLevel::Info, TIMING_MESSAGE, record.into_event());
    }
}

impl<L, C> fmt::Debug for CallTimer<L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTimer")
            .field("details", &self.details)
            .finish_non_exhaustive()
    }
}
