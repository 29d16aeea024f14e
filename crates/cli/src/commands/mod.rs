//! CLI command implementations

pub mod analytics;
pub mod seed;
