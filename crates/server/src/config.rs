//! Server configuration

use anomaly_lib::{AnomalyParams, BurstParams, GapParams};
use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the analytics, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Events file (JSON array or JSON lines) loaded as the store snapshot
    #[serde(default)]
    pub events_path: Option<String>,

    /// Serve the built-in demo stream when no events file is configured
    #[serde(default)]
    pub seed_demo_events: bool,

    /// Bucket width used when a request omits one
    #[serde(default = "default_bucket_width_days")]
    pub default_bucket_width_days: f64,

    /// Z-score threshold used when a request omits one
    #[serde(default = "default_z_threshold")]
    pub default_z_threshold: f64,

    /// Gap threshold used when a request omits one
    #[serde(default = "default_gap_threshold_days")]
    pub default_gap_threshold_days: f64,
}

fn default_api_port() -> u16 {
    8000
}

fn default_bucket_width_days() -> f64 {
    BurstParams::default().bucket_width_days
}

fn default_z_threshold() -> f64 {
    BurstParams::default().z_threshold
}

fn default_gap_threshold_days() -> f64 {
    GapParams::default().threshold_days
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            events_path: None,
            seed_demo_events: false,
            default_bucket_width_days: default_bucket_width_days(),
            default_z_threshold: default_z_threshold(),
            default_gap_threshold_days: default_gap_threshold_days(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `true-anomaly.*` file and
    /// `TRUE_ANOMALY_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("true-anomaly").required(false))
            .add_source(config::Environment::with_prefix("TRUE_ANOMALY").try_parsing(true))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Analytics parameters applied when a request leaves them out
    pub fn default_params(&self) -> AnomalyParams {
        AnomalyParams {
            burst: BurstParams {
                bucket_width_days: self.default_bucket_width_days,
                z_threshold: self.default_z_threshold,
            },
            gap: GapParams {
                threshold_days: self.default_gap_threshold_days,
                observation_end: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sources_yield_defaults() {
        let config: ServerConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api_port, 8000);
        assert!(config.events_path.is_none());
        assert!(!config.seed_demo_events);
        assert_eq!(config.default_params(), AnomalyParams::default());
    }

    #[test]
    fn test_overrides_apply() {
        let config: ServerConfig = config::Config::builder()
            .set_override("api_port", 9100)
            .unwrap()
            .set_override("default_z_threshold", 2.0)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api_port, 9100);
        assert_eq!(config.default_params().burst.z_threshold, 2.0);
        assert_eq!(config.default_params().burst.bucket_width_days, 7.0);
    }
}
