//! Stress tests for concurrent logging
//!
//! These tests verify:
//! - Records from many threads are never torn or interleaved within a line
//! - Reconfiguring while other threads log does not lose the pipeline
//! - Metrics stay consistent under contention

use rust_logging_config::handlers::{SharedBuffer, Sink};
use rust_logging_config::prelude::*;
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 200;

fn structured(buffer: &SharedBuffer, overrides: &[&str]) -> LoggingConfig {
    LoggingConfig::builder()
        .verbosity(Verbosity::Debug)
        .format(LogFormat::Structured)
        .override_logs(overrides.iter().copied())
        .sink(Sink::Buffer(buffer.clone()))
        .build()
}

/// Every line written by concurrent loggers is a complete JSON object
#[test]
fn test_concurrent_lines_are_not_torn() {
    let buffer = SharedBuffer::new();
    let ctx = configure(structured(&buffer, &["svc.access"])).expect("Failed to configure");

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = ctx.logger(if t % 2 == 0 { "svc.access" } else { "svc.worker" });
            thread::spawn(move || {
                let logger = logger.bind("thread", t);
                for i in 0..PER_THREAD {
                    logger.info(format!("message {} with a reasonably long payload", i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    let lines = buffer.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    for line in &lines {
        let parsed: serde_json::Value = serde_json::from_str(line).expect("torn line");
        assert!(parsed["thread"].is_i64());
    }
    assert_eq!(ctx.metrics().emitted_count(), (THREADS * PER_THREAD) as u64);
}

/// Reconfiguration races with logging but the context always has one root handler
#[test]
fn test_reconfigure_while_logging() {
    let buffer = SharedBuffer::new();
    let ctx = configure(structured(&buffer, &[])).expect("Failed to configure");

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let logger = ctx.logger(format!("worker.{}", t));
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.warning(format!("tick {}", i));
                }
            })
        })
        .collect();

    let reconfigurer = {
        let ctx = ctx.clone();
        let buffer = buffer.clone();
        thread::spawn(move || {
            for i in 0..20 {
                let overrides: &[&str] = if i % 2 == 0 { &["worker.0"] } else { &[] };
                ctx.reconfigure(&structured(&buffer, overrides))
                    .expect("reconfigure failed");
            }
        })
    };

    for handle in writers {
        handle.join().expect("logging thread panicked");
    }
    reconfigurer.join().expect("reconfigure thread panicked");

    assert_eq!(ctx.registry().root().handler_count(), 1);
    for line in buffer.lines() {
        serde_json::from_str::<serde_json::Value>(&line).expect("torn line");
    }
    let metrics = ctx.metrics();
    assert_eq!(metrics.handler_error_count(), 0);
    assert_eq!(metrics.dropped_count(), 0, "records lost while handlers were swapped");
    assert_eq!(metrics.emitted_count(), (4 * PER_THREAD) as u64);
    assert!(buffer.lines().len() >= 4 * PER_THREAD);
}

/// Filtered records are counted exactly under contention
#[test]
fn test_filtered_count_under_contention() {
    let buffer = SharedBuffer::new();
    let ctx = LoggingConfig::builder()
        .verbosity(Verbosity::Warning)
        .sink(Sink::Buffer(buffer.clone()))
        .configure()
        .expect("Failed to configure");
    let ctx = Arc::new(ctx);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                let logger = ctx.logger("app");
                for _ in 0..PER_THREAD {
                    logger.debug("hidden");
                    logger.error("shown");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    let total = (THREADS * PER_THREAD) as u64;
    assert_eq!(ctx.metrics().filtered_count(), total);
    assert_eq!(ctx.metrics().emitted_count(), total);
    assert_eq!(buffer.lines().len() as u64, total);
}
