//! Pipeline metrics
//!
//! Counters for records that reached a handler, records stopped by a
//! threshold or the level filter, and handler failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a [`LoggingContext`](crate::LoggingContext)
///
/// ```
/// use rust_logging_config::LoggingMetrics;
///
/// let metrics = LoggingMetrics::new();
/// metrics.record_emitted();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.emitted_count(), 1);
/// assert_eq!(metrics.filtered_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggingMetrics {
    /// Records written by every handler they were routed to
    emitted: AtomicU64,

    /// Records below a logger threshold or dropped by the chain
    filtered: AtomicU64,

    /// Records that no handler accepted, or that a handler failed to write
    dropped: AtomicU64,

    /// Individual handler failures (errors and panics)
    handler_errors: AtomicU64,
}

impl LoggingMetrics {
    pub const fn new() -> Self {
        Self {
            emitted: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn emitted_count(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn handler_error_count(&self) -> u64 {
        self.handler_errors.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_handler_error(&self) -> u64 {
        self.handler_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Percentage (0.0 - 100.0) of routed records that were dropped
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.emitted_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.emitted.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.handler_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggingMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            emitted: AtomicU64::new(self.emitted_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            dropped: AtomicU64::new(self.dropped_count()),
            handler_errors: AtomicU64::new(self.handler_error_count()),
        }
    }
}
