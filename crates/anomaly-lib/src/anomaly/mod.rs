//! Temporal anomaly detection over event streams
//!
//! This module provides:
//! - Fixed-width, zero-filled bucketing of event timestamps
//! - Mean / sample standard deviation profiling of bucket counts
//! - Burst detection (buckets whose z-score reaches a threshold)
//! - Gap detection (silences at least as long as a threshold)
//! - Merging of both into one ordered, serializable report

mod bucketizer;
mod burst_detector;
mod gap_detector;
mod profile;
mod reporter;

pub use bucketizer::{days_to_duration, width_from_days, Bucketizer, MAX_BUCKETS, MAX_WIDTH_DAYS};
pub use burst_detector::{BurstAnomaly, BurstDetector, DEFAULT_Z_THRESHOLD};
pub use gap_detector::{GapAnomaly, GapDetector, DEFAULT_GAP_THRESHOLD_DAYS};
pub use profile::Profile;
pub use reporter::{Anomaly, AnomalyKind, AnomalyRecord, AnomalyReport, AnomalyReporter};
