//! Prometheus metrics for the transcode engine.
//!
//! This module provides metrics for:
//! - Transcode runs (result, duration, rollbacks)
//! - Individual pipelines (success, failure, cancellation)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Transcode Metrics
// =============================================================================

/// Transcode runs total by result.
pub static TRANSCODES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("better_transcodes_total", "Total release transcodes"),
        &["result"], // "success", "rejected", "failed"
    )
    .unwrap()
});

/// Transcode duration in seconds.
pub static TRANSCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "better_transcode_duration_seconds",
            "Duration of release transcodes",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

/// Destination trees deleted after a failure.
pub static ROLLBACKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("better_rollbacks_total", "Total destination rollbacks"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Tracks transcoded, tagged and kept.
pub static TRACKS_TRANSCODED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "better_tracks_transcoded_total",
        "Total tracks in successful transcodes",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Process pipelines total by result.
pub static PIPELINES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("better_pipelines_total", "Total process pipelines run"),
        &["result"], // "success", "failed", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TRANSCODES_TOTAL.clone()),
        Box::new(TRANSCODE_DURATION.clone()),
        Box::new(ROLLBACKS_TOTAL.clone()),
        Box::new(TRACKS_TRANSCODED.clone()),
        Box::new(PIPELINES_TOTAL.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_once() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        PIPELINES_TOTAL.with_label_values(&["success"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "better_pipelines_total"));
    }
}
