//! True Anomaly server
//!
//! Thin HTTP surface over the anomaly engine: analytics routes, a health
//! probe and Prometheus metrics.

pub mod api;
pub mod config;
