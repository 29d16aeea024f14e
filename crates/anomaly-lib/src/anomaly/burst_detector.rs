//! Burst detection
//!
//! Scores each bucket against the profile of its siblings and flags buckets
//! whose z-score reaches a configurable threshold.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::profile::Profile;
use crate::error::{AnomalyError, Result};
use crate::models::Bucket;

/// Default z-score threshold
pub const DEFAULT_Z_THRESHOLD: f64 = 1.5;

/// Flags buckets whose count is a statistical outlier
#[derive(Debug, Clone, Copy)]
pub struct BurstDetector {
    /// Number of standard deviations above the mean to consider a burst
    z_threshold: f64,
}

impl BurstDetector {
    /// Create a detector, rejecting non-positive or non-finite thresholds
    pub fn new(z_threshold: f64) -> Result<Self> {
        if !z_threshold.is_finite() || z_threshold <= 0.0 {
            return Err(AnomalyError::invalid(
                "z_threshold",
                format!("must be a positive finite number, got {}", z_threshold),
            ));
        }
        Ok(Self { z_threshold })
    }

    pub fn z_threshold(&self) -> f64 {
        self.z_threshold
    }

    /// Detect bursts over a bucket sequence
    ///
    /// A bucket exactly at the threshold counts as a burst. When the profile
    /// has no spread, a bucket is flagged only if it lies strictly above the
    /// mean, so a uniform series never yields a burst. Output follows bucket
    /// order.
    pub fn detect(&self, buckets: &[Bucket], profile: &Profile, width: Duration) -> Vec<BurstAnomaly> {
        buckets
            .iter()
            .filter_map(|bucket| {
                let z_score = match profile.z_score(bucket.count) {
                    Some(z) if z >= self.z_threshold => z,
                    Some(_) => return None,
                    None if (bucket.count as f64) > profile.mean => f64::INFINITY,
                    None => return None,
                };

                Some(BurstAnomaly {
                    bucket_start: bucket.start,
                    bucket_end: bucket.start + width,
                    count: bucket.count,
                    mean: profile.mean,
                    std: profile.std,
                    z_score,
                    z_threshold: self.z_threshold,
                })
            })
            .collect()
    }
}

impl Default for BurstDetector {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}

/// A bucket flagged as unusually dense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstAnomaly {
    pub bucket_start: DateTime<Utc>,
    pub bucket_end: DateTime<Utc>,
    pub count: u64,
    /// Mean bucket count of the profiled series
    pub mean: f64,
    /// Sample standard deviation of the profiled series
    pub std: f64,
    pub z_score: f64,
    /// Threshold that was reached
    pub z_threshold: f64,
}
