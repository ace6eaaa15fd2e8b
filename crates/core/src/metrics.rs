//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Platform calls (job creation, execution polling)
//! - Pipeline runs and per-stage durations
//! - Local ingest fallbacks

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Platform Metrics
// =============================================================================

/// Create-job calls by result.
pub static JOBS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("slaterunner_jobs_created_total", "Total create-job calls"),
        &["result"], // "ok", "failed"
    )
    .unwrap()
});

/// Execution lookups by outcome.
pub static POLL_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "slaterunner_poll_attempts_total",
            "Total execution polling outcomes",
        ),
        &["outcome"], // "terminal", "running", "not_ready", "error", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Pipeline runs by result.
pub static PIPELINE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("slaterunner_pipeline_runs_total", "Total pipeline runs"),
        &["result"], // "success", "failed", "misconfigured"
    )
    .unwrap()
});

/// Time spent waiting on each stage's execution.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "slaterunner_stage_duration_seconds",
            "Duration of pipeline stage executions",
        )
        .buckets(vec![1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["stage", "result"],
    )
    .unwrap()
});

/// Runs that used the local CSV parser instead of the ingest agent.
pub static INGEST_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "slaterunner_ingest_fallback_total",
        "Total ingests served by the local CSV fallback",
    )
    .unwrap()
});

/// All core metrics, for registration in the server registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_CREATED.clone()),
        Box::new(POLL_ATTEMPTS.clone()),
        Box::new(PIPELINE_RUNS.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(INGEST_FALLBACKS.clone()),
    ]
}
