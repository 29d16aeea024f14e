//! Merging and serialization of anomaly findings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::burst_detector::BurstAnomaly;
use super::gap_detector::GapAnomaly;
use crate::models::Selector;

/// Kind tag carried by every serialized anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Burst,
    Gap,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::Burst => f.write_str("burst"),
            AnomalyKind::Gap => f.write_str("gap"),
        }
    }
}

/// A temporal anomaly found in one stream
#[derive(Debug, Clone, PartialEq)]
pub enum Anomaly {
    Burst(BurstAnomaly),
    Gap(GapAnomaly),
}

impl Anomaly {
    pub fn kind(&self) -> AnomalyKind {
        match self {
            Anomaly::Burst(_) => AnomalyKind::Burst,
            Anomaly::Gap(_) => AnomalyKind::Gap,
        }
    }

    /// Earliest instant the anomaly references
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            Anomaly::Burst(burst) => burst.bucket_start,
            Anomaly::Gap(gap) => gap.gap_start,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            Anomaly::Burst(burst) => burst.bucket_end,
            Anomaly::Gap(gap) => gap.gap_end,
        }
    }

    pub fn to_record(&self) -> AnomalyRecord {
        match self {
            Anomaly::Burst(burst) => AnomalyRecord {
                kind: AnomalyKind::Burst,
                start: burst.bucket_start,
                end: burst.bucket_end,
                count: Some(burst.count),
                duration_days: None,
                mean: Some(burst.mean),
                std: Some(burst.std),
                z_score: Some(burst.z_score),
                threshold: burst.z_threshold,
            },
            Anomaly::Gap(gap) => AnomalyRecord {
                kind: AnomalyKind::Gap,
                start: gap.gap_start,
                end: gap.gap_end,
                count: None,
                duration_days: Some(gap.duration_days()),
                mean: None,
                std: None,
                z_score: None,
                threshold: gap.threshold_days(),
            },
        }
    }
}

impl Serialize for Anomaly {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl From<BurstAnomaly> for Anomaly {
    fn from(burst: BurstAnomaly) -> Self {
        Anomaly::Burst(burst)
    }
}

impl From<GapAnomaly> for Anomaly {
    fn from(gap: GapAnomaly) -> Self {
        Anomaly::Gap(gap)
    }
}

/// Wire form of an anomaly
///
/// `threshold` is the z-score threshold for bursts and the threshold in days
/// for gaps. Fields that do not apply to a kind are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub kind: AnomalyKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_score: Option<f64>,
    pub threshold: f64,
}

/// Ordered anomaly result for one selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub selector: Selector,
    pub anomalies: Vec<AnomalyRecord>,
    pub total: usize,
}

impl AnomalyReport {
    pub fn new(selector: Selector, anomalies: &[Anomaly]) -> Self {
        let anomalies: Vec<AnomalyRecord> = anomalies.iter().map(Anomaly::to_record).collect();
        Self {
            selector,
            total: anomalies.len(),
            anomalies,
        }
    }
}

/// Merges burst and gap findings into one ordered sequence
pub struct AnomalyReporter;

impl AnomalyReporter {
    /// Merge and sort by earliest referenced instant
    ///
    /// Pure aggregation: nothing is filtered. The sort is stable and bursts
    /// are placed ahead of gaps before sorting, so a burst and a gap sharing
    /// a start keep that order.
    pub fn merge(bursts: Vec<BurstAnomaly>, gaps: Vec<GapAnomaly>) -> Vec<Anomaly> {
        let mut anomalies: Vec<Anomaly> = bursts
            .into_iter()
            .map(Anomaly::from)
            .chain(gaps.into_iter().map(Anomaly::from))
            .collect();
        anomalies.sort_by_key(Anomaly::start);
        anomalies
    }
}
