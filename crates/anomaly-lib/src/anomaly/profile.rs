//! Statistical profile over a bucket-count sequence

use serde::{Deserialize, Serialize};

use crate::models::Bucket;

/// Mean and sample standard deviation of a count sequence
///
/// Derived on every call; never cached across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub mean: f64,
    pub std: f64,
    pub bucket_count: usize,
}

impl Profile {
    /// Profile a raw count sequence
    ///
    /// * `n = 0` gives mean 0 and std 0
    /// * `n = 1` gives mean `counts[0]` and std 0
    /// * otherwise sample variance with divisor `n - 1`
    pub fn from_counts(counts: &[u64]) -> Self {
        let n = counts.len();
        if n == 0 {
            return Self {
                mean: 0.0,
                std: 0.0,
                bucket_count: 0,
            };
        }

        let sum: f64 = counts.iter().map(|&c| c as f64).sum();
        let mean = sum / n as f64;

        if n == 1 {
            return Self {
                mean,
                std: 0.0,
                bucket_count: 1,
            };
        }

        // Two-pass variance for stability
        let variance = counts
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64; // Bessel's correction

        Self {
            mean,
            std: variance.sqrt(),
            bucket_count: n,
        }
    }

    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        Self::from_counts(&counts)
    }

    /// Number of standard deviations `count` lies above the mean
    ///
    /// `None` when the profile has no spread.
    pub fn z_score(&self, count: u64) -> Option<f64> {
        if self.std > 0.0 {
            Some((count as f64 - self.mean) / self.std)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        let profile = Profile::from_counts(&[]);
        assert_eq!(profile.mean, 0.0);
        assert_eq!(profile.std, 0.0);
        assert_eq!(profile.bucket_count, 0);
    }

    #[test]
    fn test_single_bucket_has_zero_std() {
        let profile = Profile::from_counts(&[4]);
        assert_eq!(profile.mean, 4.0);
        assert_eq!(profile.std, 0.0);
        assert!(!profile.std.is_nan());
    }

    #[test]
    fn test_sample_std_uses_bessel_correction() {
        let profile = Profile::from_counts(&[1, 1, 1, 1, 5]);
        assert!((profile.mean - 1.8).abs() < 1e-12);
        // variance = 12.8 / 4
        assert!((profile.std - 3.2f64.sqrt()).abs() < 1e-12);
        assert_eq!(profile.bucket_count, 5);
    }

    #[test]
    fn test_sum_equals_mean_times_n() {
        let series: [&[u64]; 4] = [&[3], &[0, 0, 9], &[1, 2, 3, 4, 5, 6, 7], &[100, 0, 17, 42, 8]];
        for counts in series {
            let profile = Profile::from_counts(counts);
            let sum: u64 = counts.iter().sum();
            assert!((sum as f64 - profile.mean * counts.len() as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uniform_counts_have_no_spread() {
        let profile = Profile::from_counts(&[7, 7, 7, 7]);
        assert_eq!(profile.std, 0.0);
        assert_eq!(profile.z_score(7), None);
    }
}
