//! Gap detection
//!
//! Detects stretches of silence by scoring the interval between each pair of
//! consecutive events, plus an optional trailing interval from the last
//! event to an observation boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnomalyError, Result};
use crate::models::Interval;

/// Default silence threshold (30 days)
pub const DEFAULT_GAP_THRESHOLD_DAYS: f64 = 30.0;

/// Flags intervals at least as long as a threshold
#[derive(Debug, Clone, Copy)]
pub struct GapDetector {
    threshold: Duration,
}

impl GapDetector {
    /// Create a detector, rejecting non-positive thresholds
    pub fn new(threshold: Duration) -> Result<Self> {
        if threshold <= Duration::zero() {
            return Err(AnomalyError::invalid(
                "threshold",
                format!("must be positive, got {}ms", threshold.num_milliseconds()),
            ));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Intervals between consecutive timestamps, followed by the trailing
    /// interval when `observation_end` is supplied
    ///
    /// A trailing boundary at or before the last event contributes nothing.
    pub fn intervals(
        timestamps: &[DateTime<Utc>],
        observation_end: Option<DateTime<Utc>>,
    ) -> Vec<Interval> {
        let mut intervals: Vec<Interval> = timestamps
            .windows(2)
            .map(|pair| Interval::between(pair[0], pair[1]))
            .collect();

        if let (Some(&last), Some(end)) = (timestamps.last(), observation_end) {
            if end > last {
                intervals.push(Interval::between(last, end));
            }
        }

        intervals
    }

    /// Detect gaps over a sorted timestamp sequence
    pub fn detect(
        &self,
        timestamps: &[DateTime<Utc>],
        observation_end: Option<DateTime<Utc>>,
    ) -> Vec<GapAnomaly> {
        Self::intervals(timestamps, observation_end)
            .into_iter()
            .filter(|interval| interval.duration >= self.threshold)
            .map(|interval| GapAnomaly {
                gap_start: interval.start,
                gap_end: interval.end,
                duration: interval.duration,
                threshold: self.threshold,
            })
            .collect()
    }
}

/// A silence at least as long as the configured threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapAnomaly {
    pub gap_start: DateTime<Utc>,
    pub gap_end: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    #[serde(with = "duration_millis")]
    pub threshold: Duration,
}

impl GapAnomaly {
    /// Gap length in fractional days
    pub fn duration_days(&self) -> f64 {
        duration_to_days(self.duration)
    }

    pub fn threshold_days(&self) -> f64 {
        duration_to_days(self.threshold)
    }
}

pub(crate) fn duration_to_days(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / (24.0 * 60.0 * 60.0 * 1000.0)
}

mod duration_millis {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        i64::deserialize(deserializer).map(Duration::milliseconds)
    }
}
