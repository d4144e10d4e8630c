//! Logging setup for the Agent Canvas bridge.

use std::env;

use serde::{Deserialize, Serialize};

pub mod logging;

pub use logging::{init_logging, LogExt};

/// Configuration for initializing logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup record
    pub service_name: String,
    /// Log level filter (e.g., "info,canvas_bridge=debug")
    pub log_filter: String,
    /// Emit JSON lines instead of human-readable output
    pub enable_json_logging: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "canvas-bridge".to_string(),
            log_filter: "info".to_string(),
            enable_json_logging: false,
        }
    }
}

impl MonitoringConfig {
    /// Read `LOG_LEVEL` and `LOG_FORMAT` on top of the defaults.
    ///
    /// Needs nothing else from the environment, so logging can start before
    /// the rest of the configuration is loaded.
    pub fn from_env(service_name: &str) -> Self {
        Self::from_values(
            service_name,
            env::var("LOG_LEVEL").ok(),
            env::var("LOG_FORMAT").ok(),
        )
    }

    fn from_values(service_name: &str, level: Option<String>, format: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            log_filter: level.unwrap_or(defaults.log_filter),
            enable_json_logging: format.map_or(defaults.enable_json_logging, |f| {
                f.eq_ignore_ascii_case("json")
            }),
        }
    }
}
