//! Basic logging configuration example
//!
//! Demonstrates both output formats, external logger suppression and call timing.
//!
//! Run with: cargo run --example basic_usage -- [-v ...] [--json]

use rust_logging_config::prelude::*;
use rust_logging_config::{info, warning};
use std::thread;
use std::time::Duration;

fn slow_add((a, b): (u64, u64)) -> u64 {
    thread::sleep(Duration::from_millis(20));
    a + b
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbosity = args
        .iter()
        .filter(|arg| arg.starts_with("-v"))
        .map(|arg| arg.chars().filter(|&c| c == 'v').count() as u32)
        .sum::<u32>();
    let format = if args.iter().any(|arg| arg == "--json") {
        LogFormat::Structured
    } else {
        LogFormat::Text
    };

    println!("=== Rust Logging Config - Basic Usage Example ===\n");

    let ctx = default_logging(
        Verbosity::from_ordinal(verbosity),
        format,
        &["noisy.dependency"],
        &["svc.access"],
    )?;

    println!(
        "1. Configured {} output at level {} (verbosity {})",
        ctx.format(),
        ctx.level(),
        ctx.verbosity()
    );
    let logger = ctx.logger("demo");
    logger.debug("debug message (needs -vv)");
    logger.info("info message (needs -v)");
    logger.warning("warning message (always visible)");
    info!(logger, "listening on port {}", 8080; service = "demo");

    println!("\n2. External loggers stay at WARNING below -vvv:");
    let noisy = ctx.logger("noisy.dependency");
    noisy.info("chatty dependency message");
    warning!(noisy, "dependency warning");

    println!("\n3. Timing a call:");
    let timer = CallTimer::new(logger.bind("component", "math"), true);
    let sum = timer.call_detailed("slow_add", (2, 3), slow_add);
    println!("   slow_add returned {}", sum);

    println!("\n4. Logging an error with its cause:");
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
    logger.exception("could not load configuration", &err);

    ctx.flush()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
