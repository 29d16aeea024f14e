//! Observability infrastructure for the anomaly engine
//!
//! Provides:
//! - Prometheus metrics (computation latency, events analyzed, anomalies by kind, rejections)
//! - Structured logging of findings with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::info;

use crate::anomaly::{Anomaly, AnomalyKind};
use crate::models::Selector;

/// Histogram buckets for computation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct EngineMetricsInner {
    computation_latency_seconds: HistogramVec,
    events_analyzed: IntCounter,
    anomalies_detected: IntCounterVec,
    rejected_requests: IntCounterVec,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            computation_latency_seconds: register_histogram_vec!(
                "true_anomaly_computation_latency_seconds",
                "Time spent computing anomalies for one selector",
                &["operation"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register computation_latency_seconds"),

            events_analyzed: register_int_counter!(
                "true_anomaly_events_analyzed_total",
                "Total number of events fed into anomaly detection"
            )
            .expect("Failed to register events_analyzed"),

            anomalies_detected: register_int_counter_vec!(
                "true_anomaly_anomalies_detected_total",
                "Total number of anomalies detected",
                &["kind"]
            )
            .expect("Failed to register anomalies_detected"),

            rejected_requests: register_int_counter_vec!(
                "true_anomaly_rejected_requests_total",
                "Total number of computations rejected before running",
                &["reason"]
            )
            .expect("Failed to register rejected_requests"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    /// Record how long one `compute_*` call took
    pub fn observe_computation_latency(&self, operation: &str, duration_secs: f64) {
        self.inner()
            .computation_latency_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn add_events_analyzed(&self, count: usize) {
        self.inner().events_analyzed.inc_by(count as u64);
    }

    pub fn inc_anomalies_detected(&self, kind: AnomalyKind) {
        self.inner()
            .anomalies_detected
            .with_label_values(&[&kind.to_string()])
            .inc();
    }

    /// Count a computation rejected with the given error code
    pub fn inc_rejected(&self, reason: &str) {
        self.inner().rejected_requests.with_label_values(&[reason]).inc();
    }
}

/// Structured logger for anomaly findings
///
/// Emits one `anomaly_detected` event per finding with consistent fields.
#[derive(Clone, Default)]
pub struct AnomalyLogger;

impl AnomalyLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn log_anomaly(&self, selector: &Selector, anomaly: &Anomaly) {
        match anomaly {
            Anomaly::Burst(burst) => {
                info!(
                    event = "anomaly_detected",
                    anomaly_type = "burst",
                    selector = %selector,
                    start = %burst.bucket_start,
                    end = %burst.bucket_end,
                    count = burst.count,
                    mean = burst.mean,
                    std = burst.std,
                    z_score = burst.z_score,
                    "Burst detected"
                );
            }
            Anomaly::Gap(gap) => {
                info!(
                    event = "anomaly_detected",
                    anomaly_type = "gap",
                    selector = %selector,
                    start = %gap.gap_start,
                    end = %gap.gap_end,
                    duration_days = gap.duration_days(),
                    threshold_days = gap.threshold_days(),
                    "Gap detected"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_metrics_creation() {
        // Metrics live in the global registry, so repeated handles share them
        let metrics = EngineMetrics::new();
        let other = EngineMetrics::new();

        metrics.observe_computation_latency("bursts", 0.001);
        metrics.add_events_analyzed(9);
        metrics.inc_anomalies_detected(AnomalyKind::Burst);
        other.inc_anomalies_detected(AnomalyKind::Gap);
        other.inc_rejected("invalid_parameter");

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "true_anomaly_anomalies_detected_total"));
    }
}
