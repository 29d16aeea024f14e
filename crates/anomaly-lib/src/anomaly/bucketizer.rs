//! Fixed-width time bucketing
//!
//! Partitions a sorted timestamp sequence into contiguous, zero-filled
//! buckets. Empty windows are materialized with a count of zero so that the
//! profile computed over the buckets reflects quiet periods as well as busy
//! ones.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::{AnomalyError, Result};
use crate::models::Bucket;

/// Upper bound on the number of buckets a single call may materialize
pub const MAX_BUCKETS: i64 = 1_000_000;

/// Upper bound on a bucket width (100 years)
pub const MAX_WIDTH_DAYS: f64 = 36_500.0;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const NANOS_PER_DAY: f64 = 86_400_000_000_000.0;

fn check_positive(name: &str, days: f64) -> Result<()> {
    if !days.is_finite() {
        return Err(AnomalyError::invalid(name, "must be a finite number"));
    }
    if days <= 0.0 {
        return Err(AnomalyError::invalid(name, format!("must be positive, got {}", days)));
    }
    Ok(())
}

/// Convert a span in (possibly fractional) days into a duration
///
/// Rounds up to the next nanosecond, or to the next millisecond for spans
/// too long for nanosecond precision, so the result is never shorter than
/// the requested span.
pub fn days_to_duration(name: &str, days: f64) -> Result<Duration> {
    check_positive(name, days)?;

    let nanos = (days * NANOS_PER_DAY).ceil();
    if nanos < i64::MAX as f64 {
        return Ok(Duration::nanoseconds(nanos as i64));
    }

    let millis = (days * MILLIS_PER_DAY as f64).ceil();
    if millis < i64::MAX as f64 {
        if let Some(duration) = Duration::try_milliseconds(millis as i64) {
            return Ok(duration);
        }
    }

    Err(AnomalyError::invalid(name, format!("is too large to represent, got {}", days)))
}

/// Convert a bucket width in (possibly fractional) days into a duration
///
/// Widths are whole milliseconds and capped at [`MAX_WIDTH_DAYS`].
pub fn width_from_days(name: &str, days: f64) -> Result<Duration> {
    check_positive(name, days)?;
    if days > MAX_WIDTH_DAYS {
        return Err(AnomalyError::invalid(
            name,
            format!("must not exceed {} days, got {}", MAX_WIDTH_DAYS, days),
        ));
    }

    let millis = (days * MILLIS_PER_DAY as f64).round() as i64;
    if millis <= 0 {
        return Err(AnomalyError::invalid(name, "is shorter than one millisecond"));
    }

    Ok(Duration::milliseconds(millis))
}

/// Partitions timestamps into fixed-width buckets
#[derive(Debug, Clone, Copy)]
pub struct Bucketizer {
    width: Duration,
}

impl Bucketizer {
    /// Create a bucketizer, rejecting non-positive widths
    pub fn new(width: Duration) -> Result<Self> {
        if width <= Duration::zero() {
            return Err(AnomalyError::invalid(
                "bucket_width",
                format!("must be positive, got {}ms", width.num_milliseconds()),
            ));
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    /// Start of the bucket grid for a series beginning at `first`
    ///
    /// Widths of a day or more anchor at UTC midnight of the first event's
    /// day. Shorter widths anchor at the nearest multiple of the width since
    /// the Unix epoch.
    pub fn anchor(&self, first: DateTime<Utc>) -> DateTime<Utc> {
        let grain = self.width.num_milliseconds().min(MILLIS_PER_DAY);
        let ts = first.timestamp_millis();
        let floored = ts.div_euclid(grain) * grain;
        Utc.timestamp_millis_opt(floored).single().unwrap_or(first)
    }

    /// Number of buckets needed to cover `[first, last]`
    pub fn bucket_count(&self, first: DateTime<Utc>, last: DateTime<Utc>) -> i64 {
        let anchor = self.anchor(first);
        (last - anchor).num_milliseconds().div_euclid(self.width.num_milliseconds()) + 1
    }

    /// Bucket a sorted timestamp sequence
    ///
    /// Every bucket from the anchor through the one holding the last
    /// timestamp is present, including empty ones. An empty input yields an
    /// empty bucket sequence.
    pub fn bucketize(&self, timestamps: &[DateTime<Utc>]) -> Result<Vec<Bucket>> {
        let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
            return Ok(Vec::new());
        };

        let n = self.bucket_count(first, last);
        if n > MAX_BUCKETS {
            return Err(AnomalyError::invalid(
                "bucket_width",
                format!(
                    "would produce {} buckets over the observed span (max {})",
                    n, MAX_BUCKETS
                ),
            ));
        }

        let anchor = self.anchor(first);
        let width_ms = self.width.num_milliseconds();
        let mut counts = vec![0u64; n as usize];

        for ts in timestamps {
            let index = (*ts - anchor).num_milliseconds().div_euclid(width_ms);
            // Input is sorted, so every index lies in [0, n)
            if let Some(count) = counts.get_mut(index as usize) {
                *count += 1;
            }
        }

        Ok(counts
            .into_iter()
            .enumerate()
            .map(|(k, count)| Bucket {
                start: anchor + Duration::milliseconds(width_ms * k as i64),
                count,
            })
            .collect())
    }
}
