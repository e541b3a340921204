//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job queue claims and crash recovery
//! - Download worker handlers (outcomes and durations)
//! - Feed admissions

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Queue Metrics
// =============================================================================

/// Jobs claimed by the worker poll loop.
pub static JOBS_CLAIMED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("youcast_jobs_claimed_total", "Total jobs claimed by status"),
        &["status"], // "added", "downloaded", "failed", ...
    )
    .unwrap()
});

/// Claims released by the startup recovery pass.
pub static STALE_JOBS_RESET: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "youcast_stale_jobs_reset_total",
        "Jobs rewritten by crash recovery",
    )
    .unwrap()
});

/// Jobs enqueued through the feed service.
pub static JOBS_ENQUEUED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("youcast_jobs_enqueued_total", "Total jobs enqueued").unwrap()
});

// =============================================================================
// Worker Metrics
// =============================================================================

/// Handler outcomes by stage and result.
pub static HANDLER_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "youcast_handler_outcomes_total",
            "Download worker handler outcomes",
        ),
        &["stage", "result"], // stage: "download", "conversion", "failure"
    )
    .unwrap()
});

/// Handler duration in seconds.
pub static HANDLER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "youcast_handler_duration_seconds",
            "Duration of download worker handlers",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        &["stage"],
    )
    .unwrap()
});

/// Handlers currently running.
pub static HANDLERS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "youcast_handlers_in_flight",
        "Number of job handlers currently running",
    )
    .unwrap()
});

/// Bytes written by successful downloads.
pub static BYTES_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "youcast_bytes_downloaded_total",
        "Total bytes fetched into media storage",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Queue
        Box::new(JOBS_CLAIMED.clone()),
        Box::new(STALE_JOBS_RESET.clone()),
        Box::new(JOBS_ENQUEUED.clone()),
        // Worker
        Box::new(HANDLER_OUTCOMES.clone()),
        Box::new(HANDLER_DURATION.clone()),
        Box::new(HANDLERS_IN_FLIGHT.clone()),
        Box::new(BYTES_DOWNLOADED.clone()),
    ]
}
