//! Prometheus metrics for qsync.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on duplicate
//! metric names, which is a programming error caught on first use.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Batch runs by outcome (ok / rejected).
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "qsync_runs_total",
        "Synchronization runs by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Order templates by outcome (synced / failed).
pub static TEMPLATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "qsync_templates_total",
        "Order templates processed by outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static ENTRIES_UPDATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "qsync_entries_updated_total",
        "Order entries whose quantity was rewritten"
    )
    .unwrap()
});

pub static ENTRY_WARNINGS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "qsync_entry_warnings_total",
        "Order entries skipped because of an unexpected shape"
    )
    .unwrap()
});

pub static UNITS_WARNINGS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "qsync_units_warnings_total",
        "Portfolio rows whose units were not numeric"
    )
    .unwrap()
});

pub static RUN_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "qsync_run_duration_ms",
        "Synchronization run duration in milliseconds",
        vec![0.5, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a completed run.
    pub fn run_completed(duration_ms: f64) {
        RUNS_TOTAL.with_label_values(&["ok"]).inc();
        RUN_DURATION_MS.observe(duration_ms);
    }

    /// Record a run rejected before any template was processed.
    pub fn run_rejected() {
        RUNS_TOTAL.with_label_values(&["rejected"]).inc();
    }

    pub fn template_synced(updated: usize, warnings: usize) {
        TEMPLATES_TOTAL.with_label_values(&["synced"]).inc();
        ENTRIES_UPDATED_TOTAL.inc_by(updated as u64);
        ENTRY_WARNINGS_TOTAL.inc_by(warnings as u64);
    }

    pub fn template_failed() {
        TEMPLATES_TOTAL.with_label_values(&["failed"]).inc();
    }

    pub fn units_coerced(count: usize) {
        UNITS_WARNINGS_TOTAL.inc_by(count as u64);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn encode_text() -> TelemetryResult<String> {
        // Touch lazies so they appear before the first run.
        Lazy::force(&RUNS_TOTAL);
        Lazy::force(&TEMPLATES_TOTAL);
        Lazy::force(&ENTRIES_UPDATED_TOTAL);
        Lazy::force(&ENTRY_WARNINGS_TOTAL);
        Lazy::force(&UNITS_WARNINGS_TOTAL);
        Lazy::force(&RUN_DURATION_MS);

        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
