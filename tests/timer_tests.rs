//! Integration tests for call timing
//!
//! These tests verify:
//! - Exactly one timing event per invocation
//! - Values, errors and panics pass through unchanged
//! - Argument and result details
//! - Timing events through a configured logger

use parking_lot::Mutex;
use rust_logging_config::handlers::{SharedBuffer, Sink};
use rust_logging_config::prelude::*;
use rust_logging_config::timer::{ManualClock, TIMING_MESSAGE};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingFacade {
    events: Mutex<Vec<(LogLevel, String, EventDict)>>,
}

impl RecordingFacade {
    fn events(&self) -> Vec<(LogLevel, String, EventDict)> {
        self.events.lock().clone()
    }
}

impl LogFacade for RecordingFacade {
    fn log_event(&self, level: LogLevel, message: &str, fields: EventDict) {
        self.events.lock().push((level, message.to_string(), fields));
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ValueError(String);

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueError: {}", self.0)
    }
}

impl std::error::Error for ValueError {}

fn answer() -> i32 {
    42
}

#[test]
fn test_value_passes_through_with_one_event() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, false);

    let value = timer.call("answer", (), |()| answer());

    assert_eq!(value, 42);
    let events = facade.events();
    assert_eq!(events.len(), 1);

    let (level, message, fields) = &events[0];
    assert_eq!(*level, LogLevel::Info);
    assert_eq!(message, TIMING_MESSAGE);
    assert_eq!(fields.get("function").and_then(FieldValue::as_str), Some("answer"));
    assert!(fields.get("duration").and_then(FieldValue::as_f64).unwrap() >= 0.0);
    assert_eq!(fields.get("outcome").and_then(FieldValue::as_str), Some("success"));
}

#[test]
fn test_error_passes_through_with_one_event() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, true);

    let result: std::result::Result<i32, ValueError> =
        timer.call_fallible_detailed("parse", ("x",), |(raw,)| Err(ValueError(raw.to_string())));

    assert_eq!(result, Err(ValueError("x".to_string())));
    let events = facade.events();
    assert_eq!(events.len(), 1);

    let fields = &events[0].2;
    assert_eq!(fields.get("outcome").and_then(FieldValue::as_str), Some("error"));
    assert!(fields.contains_key("args"));
    assert!(!fields.contains_key("result"));
}

#[test]
fn test_details_record_args_and_result() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, true);

    let sum = timer.call_detailed("f", (1, 2), |(a, b)| a + b);

    assert_eq!(sum, 3);
    let fields = &facade.events()[0].2;
    assert_eq!(
        fields.get("args"),
        Some(&FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(2)]))
    );
    assert_eq!(fields.get("result"), Some(&FieldValue::Int(3)));
}

#[test]
fn test_plain_call_never_records_details() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, true);

    assert_eq!(timer.call("f", (1, 2), |(a, b)| a + b), 3);

    let fields = &facade.events()[0].2;
    assert!(!fields.contains_key("args"));
    assert!(!fields.contains_key("result"));
}

/// Neither argument nor result implements `Serialize`
struct Connection {
    port: u16,
}

#[test]
fn test_times_callables_without_serialize() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, false);

    let conn = timer.call("connect", Connection { port: 80 }, |c| Connection { port: c.port + 1 });
    assert_eq!(conn.port, 81);

    let opened: std::result::Result<Connection, String> =
        timer.call_fallible("open", 8080u16, |port| Ok(Connection { port }));
    assert_eq!(opened.map(|c| c.port), Ok(8080));

    let timed = timer.wrap(|port: u16| Connection { port });
    assert_eq!(timed(443).port, 443);

    let events = facade.events();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|(_, _, fields)| fields.get("outcome").and_then(FieldValue::as_str) == Some("success")));
}

#[test]
fn test_wrap_detailed_records_each_call() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, true);
    let timed = timer.wrap_detailed("double", |x: i64| x * 2);

    assert_eq!(timed(21), 42);

    let fields = &facade.events()[0].2;
    assert_eq!(fields.get("function").and_then(FieldValue::as_str), Some("double"));
    assert_eq!(fields.get("args"), Some(&FieldValue::Int(21)));
    assert_eq!(fields.get("result"), Some(&FieldValue::Int(42)));
}

#[test]
fn test_no_details_without_flag() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, false);

    timer.call_detailed("f", (1, 2), |(a, b)| a + b);

    let fields = &facade.events()[0].2;
    assert!(!fields.contains_key("args"));
    assert!(!fields.contains_key("result"));
    assert_eq!(fields.len(), 3);
}

#[test]
fn test_panic_is_reported_then_resumed() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, true);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        timer.call_detailed("explode", (), |()| -> i32 { panic!("boom") })
    }));

    let payload = outcome.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));

    let events = facade.events();
    assert_eq!(events.len(), 1);
    let fields = &events[0].2;
    assert_eq!(fields.get("outcome").and_then(FieldValue::as_str), Some("error"));
    assert!(!fields.contains_key("result"));
}

#[test]
fn test_manual_clock_gives_exact_duration() {
    let clock = Arc::new(ManualClock::new());
    clock.set(Duration::from_secs(100));
    let facade = RecordingFacade::default();
    let timer = CallTimer::with_clock(&facade, false, Arc::clone(&clock));

    timer.call("sleepy", (), |()| clock.advance(Duration::from_millis(250)));

    let fields = &facade.events()[0].2;
    assert_eq!(fields.get("duration").and_then(FieldValue::as_f64), Some(0.25));
}

#[test]
fn test_wrapped_function_times_every_call() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, false);
    let timed = timer.wrap_named("square", |x: i64| x * x);

    let results: Vec<i64> = (1..=3).map(&timed).collect();

    assert_eq!(results, vec![1, 4, 9]);
    let events = facade.events();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|(_, _, fields)| fields.get("function").and_then(FieldValue::as_str) == Some("square")));
}

#[test]
fn test_wrap_uses_qualified_name() {
    let facade = RecordingFacade::default();
    let timer = CallTimer::new(&facade, false);
    let timed = timer.wrap(|()| answer());

    assert_eq!(timed(()), 42);
    let function = facade.events()[0]
        .2
        .get("function")
        .and_then(FieldValue::as_str)
        .map(String::from)
        .unwrap();
    assert!(function.contains("test_wrap_uses_qualified_name"), "got {}", function);
}

#[test]
fn test_timer_through_structured_logger() {
    let buffer = SharedBuffer::new();
    let ctx = LoggingConfig::builder()
        .verbosity(Verbosity::Info)
        .format(LogFormat::Structured)
        .sink(Sink::Buffer(buffer.clone()))
        .configure()
        .unwrap();

    let timer = CallTimer::new(ctx.logger("perf"), true);
    let joined = timer.call_detailed("join", (vec!["a", "b"], "-"), |(parts, sep)| parts.join(sep));
    assert_eq!(joined, "a-b");

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    let parsed: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(parsed["message"], TIMING_MESSAGE);
    assert_eq!(parsed["function"], "join");
    assert_eq!(parsed["level"], "info");
    assert_eq!(parsed["logger"], "perf");
    assert_eq!(parsed["args"], serde_json::json!([["a", "b"], "-"]));
    assert_eq!(parsed["result"], "a-b");
    assert!(parsed["duration"].as_f64().unwrap() >= 0.0);
}

#[test]
fn test_timer_respects_logger_threshold() {
    let buffer = SharedBuffer::new();
    let ctx = LoggingConfig::builder()
        .verbosity(Verbosity::Warning)
        .sink(Sink::Buffer(buffer.clone()))
        .configure()
        .unwrap();

    let timer = CallTimer::new(Arc::new(ctx.logger("perf")), false);
    assert_eq!(timer.call("quiet", (), |()| 1), 1);
    assert!(buffer.is_empty());
}
