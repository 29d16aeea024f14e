//! Temporal anomaly engine for investigative event streams
//!
//! This crate provides the core functionality for:
//! - Selecting event streams by entity, entity pair or source
//! - Fixed-width bucketing and statistical profiling of activity
//! - Burst and gap detection, merged into ordered reports
//! - The event store boundary the engine reads snapshots from
//! - Metrics and structured logging of findings

pub mod anomaly;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod models;
pub mod observability;
pub mod store;

pub use anomaly::{Anomaly, AnomalyKind, AnomalyRecord, AnomalyReport, BurstAnomaly, GapAnomaly};
pub use engine::{
    detect_anomalies, detect_bursts, detect_gaps, AnomalyEngine, AnomalyParams, BurstParams,
    GapParams,
};
pub use error::{AnomalyError, Result, SelectorParseError, StoreError};
pub use models::*;
pub use observability::{AnomalyLogger, EngineMetrics};
pub use store::{EventStore, InMemoryEventStore};
