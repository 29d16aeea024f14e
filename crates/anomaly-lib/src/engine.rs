//! Selector-driven anomaly computation
//!
//! Control flow per call: validate parameters, fetch the selector's events,
//! sort them, then bucket + profile + score for bursts and scan intervals
//! for gaps. Nothing is retained between calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::anomaly::{
    days_to_duration, width_from_days, Anomaly, AnomalyReporter, BurstAnomaly, BurstDetector,
    Bucketizer, GapAnomaly, GapDetector, Profile, DEFAULT_GAP_THRESHOLD_DAYS, DEFAULT_Z_THRESHOLD,
};
use crate::error::{AnomalyError, Result};
use crate::models::{Event, Selector};
use crate::observability::{AnomalyLogger, EngineMetrics};
use crate::store::EventStore;

/// Default bucket width (one week)
pub const DEFAULT_BUCKET_WIDTH_DAYS: f64 = 7.0;

/// Burst detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstParams {
    pub bucket_width_days: f64,
    pub z_threshold: f64,
}

impl Default for BurstParams {
    fn default() -> Self {
        Self {
            bucket_width_days: DEFAULT_BUCKET_WIDTH_DAYS,
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}

impl BurstParams {
    /// Validate and build the bucketizer and detector
    pub fn build(&self) -> Result<(Bucketizer, BurstDetector)> {
        let width = width_from_days("bucket_width_days", self.bucket_width_days)?;
        let bucketizer = Bucketizer::new(width)?;
        let detector = BurstDetector::new(self.z_threshold)?;
        Ok((bucketizer, detector))
    }
}

/// Gap detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapParams {
    pub threshold_days: f64,
    /// Boundary for trailing silence; no trailing gap when absent
    pub observation_end: Option<DateTime<Utc>>,
}

impl Default for GapParams {
    fn default() -> Self {
        Self {
            threshold_days: DEFAULT_GAP_THRESHOLD_DAYS,
            observation_end: None,
        }
    }
}

impl GapParams {
    pub fn build(&self) -> Result<GapDetector> {
        let threshold = days_to_duration("threshold_days", self.threshold_days)?;
        GapDetector::new(threshold)
    }
}

/// Parameters for the merged burst + gap view
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalyParams {
    pub burst: BurstParams,
    pub gap: GapParams,
}

fn sorted_timestamps(events: &[Event]) -> Vec<DateTime<Utc>> {
    let mut timestamps: Vec<DateTime<Utc>> = events.iter().map(|e| e.timestamp).collect();
    timestamps.sort_unstable();
    timestamps
}

fn run_bursts(
    timestamps: &[DateTime<Utc>],
    bucketizer: &Bucketizer,
    detector: &BurstDetector,
) -> Result<Vec<BurstAnomaly>> {
    let buckets = bucketizer.bucketize(timestamps)?;
    let profile = Profile::from_buckets(&buckets);
    debug!(
        buckets = buckets.len(),
        mean = profile.mean,
        std = profile.std,
        "Profiled bucket counts"
    );
    Ok(detector.detect(&buckets, &profile, bucketizer.width()))
}

/// Detect bursts in an event snapshot
pub fn detect_bursts(events: &[Event], params: &BurstParams) -> Result<Vec<BurstAnomaly>> {
    let (bucketizer, detector) = params.build()?;
    run_bursts(&sorted_timestamps(events), &bucketizer, &detector)
}

/// Detect gaps in an event snapshot
pub fn detect_gaps(events: &[Event], params: &GapParams) -> Result<Vec<GapAnomaly>> {
    let detector = params.build()?;
    Ok(detector.detect(&sorted_timestamps(events), params.observation_end))
}

/// Detect bursts and gaps in an event snapshot, merged by start
pub fn detect_anomalies(events: &[Event], params: &AnomalyParams) -> Result<Vec<Anomaly>> {
    let (bucketizer, burst_detector) = params.burst.build()?;
    let gap_detector = params.gap.build()?;

    let timestamps = sorted_timestamps(events);
    let bursts = run_bursts(&timestamps, &bucketizer, &burst_detector)?;
    let gaps = gap_detector.detect(&timestamps, params.gap.observation_end);

    Ok(AnomalyReporter::merge(bursts, gaps))
}

/// Stateless anomaly engine over an event store
///
/// Safe to share across threads: every call works on its own snapshot.
pub struct AnomalyEngine<S> {
    store: S,
    metrics: EngineMetrics,
    logger: AnomalyLogger,
}

impl<S: EventStore> AnomalyEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            metrics: EngineMetrics::new(),
            logger: AnomalyLogger::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bursts for the selector's stream, ascending by bucket start
    pub fn compute_bursts(&self, selector: &Selector, params: &BurstParams) -> Result<Vec<BurstAnomaly>> {
        let started = Instant::now();
        let (bucketizer, detector) = self.validated(params.build())?;
        let events = self.fetch(selector)?;

        let bursts = self.validated(run_bursts(
            &sorted_timestamps(&events),
            &bucketizer,
            &detector,
        ))?;

        let anomalies: Vec<Anomaly> = bursts.iter().cloned().map(Anomaly::from).collect();
        self.record("bursts", selector, events.len(), &anomalies, started);
        Ok(bursts)
    }

    /// Gaps for the selector's stream, ascending by gap start
    pub fn compute_gaps(&self, selector: &Selector, params: &GapParams) -> Result<Vec<GapAnomaly>> {
        let started = Instant::now();
        let detector = self.validated(params.build())?;
        let events = self.fetch(selector)?;

        let gaps = detector.detect(&sorted_timestamps(&events), params.observation_end);

        let anomalies: Vec<Anomaly> = gaps.iter().cloned().map(Anomaly::from).collect();
        self.record("gaps", selector, events.len(), &anomalies, started);
        Ok(gaps)
    }

    /// Bursts and gaps merged into one sequence ordered by start
    pub fn compute_anomalies(&self, selector: &Selector, params: &AnomalyParams) -> Result<Vec<Anomaly>> {
        let started = Instant::now();
        let (bucketizer, burst_detector) = self.validated(params.burst.build())?;
        let gap_detector = self.validated(params.gap.build())?;
        let events = self.fetch(selector)?;

        let timestamps = sorted_timestamps(&events);
        let bursts = self.validated(run_bursts(&timestamps, &bucketizer, &burst_detector))?;
        let gaps = gap_detector.detect(&timestamps, params.gap.observation_end);
        let anomalies = AnomalyReporter::merge(bursts, gaps);

        self.record("anomalies", selector, events.len(), &anomalies, started);
        Ok(anomalies)
    }

    fn fetch(&self, selector: &Selector) -> Result<Vec<Event>> {
        self.store.fetch_events(selector).map_err(|err| {
            warn!(selector = %selector, error = %err, "Event retrieval failed");
            self.metrics.inc_rejected("retrieval_failed");
            AnomalyError::from(err)
        })
    }

    fn validated<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!(error = %err, "Rejected anomaly computation");
            self.metrics.inc_rejected(err.code());
        }
        result
    }

    fn record(
        &self,
        operation: &str,
        selector: &Selector,
        events: usize,
        anomalies: &[Anomaly],
        started: Instant,
    ) {
        self.metrics
            .observe_computation_latency(operation, started.elapsed().as_secs_f64());
        self.metrics.add_events_analyzed(events);
        for anomaly in anomalies {
            self.metrics.inc_anomalies_detected(anomaly.kind());
            self.logger.log_anomaly(selector, anomaly);
        }

        info!(
            operation = %operation,
            selector = %selector,
            events = events,
            anomalies = anomalies.len(),
            "Computed anomalies"
        );
    }
}
