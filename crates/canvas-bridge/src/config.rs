//! Configuration for the canvas bridge
//!
//! Defaults reproduce the observed timing of the canvas client; every value
//! can be overridden from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use canvas_core::EdgePolicy;
use canvas_monitoring::MonitoringConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BridgeError, BridgeResult};

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Address of the command source
    #[serde(default = "default_url")]
    pub url: String,

    /// Reconnect delay unit in milliseconds
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,

    /// Attempt count after which the delay stops growing
    #[serde(default = "default_reconnect_cap_attempts")]
    pub reconnect_cap_attempts: u32,

    /// Upper bound on the reconnect delay in milliseconds
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,

    /// Quiet period before local edits are pushed, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Pause between a forced reset and the new connection attempt
    #[serde(default = "default_manual_reconnect_delay_ms")]
    pub manual_reconnect_delay_ms: u64,

    /// Whether `connect_nodes` accepts edges to missing nodes
    #[serde(default)]
    pub dangling_edges: EdgePolicy,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,
}

/// Service name attached to log output
pub const SERVICE_NAME: &str = "canvas-bridge";

fn default_url() -> String {
    "ws://localhost:3001".to_string()
}

fn default_reconnect_base_delay_ms() -> u64 {
    3000
}

fn default_reconnect_cap_attempts() -> u32 {
    5
}

fn default_reconnect_max_delay_ms() -> u64 {
    15_000
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_manual_reconnect_delay_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn parse_env<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(raw) = env::var(name) {
        match raw.parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!("Invalid {} value: {}", name, raw),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn load() -> BridgeResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var("CANVAS_BRIDGE_URL") {
            config.url = url;
        }

        parse_env("CANVAS_BRIDGE_RECONNECT_BASE_MS", &mut config.reconnect_base_delay_ms);
        parse_env("CANVAS_BRIDGE_RECONNECT_CAP_ATTEMPTS", &mut config.reconnect_cap_attempts);
        parse_env("CANVAS_BRIDGE_RECONNECT_MAX_MS", &mut config.reconnect_max_delay_ms);
        parse_env("CANVAS_BRIDGE_DEBOUNCE_MS", &mut config.debounce_ms);
        parse_env("CANVAS_BRIDGE_MANUAL_RECONNECT_MS", &mut config.manual_reconnect_delay_ms);

        if let Ok(policy) = env::var("CANVAS_BRIDGE_DANGLING_EDGES") {
            config.dangling_edges = match policy.to_lowercase().as_str() {
                "permissive" => EdgePolicy::Permissive,
                "reject" => EdgePolicy::Reject,
                _ => {
                    warn!("Invalid CANVAS_BRIDGE_DANGLING_EDGES value: {}, using permissive", policy);
                    EdgePolicy::Permissive
                }
            };
        }

        let logging = MonitoringConfig::from_env(SERVICE_NAME);
        config.log_level = logging.log_filter;
        config.json_logs = logging.enable_json_logging;

        config.validate()?;

        info!(
            url = %config.url,
            log_level = %config.log_level,
            json_logs = config.json_logs,
            "Loaded bridge configuration"
        );
        Ok(config)
    }

    /// Reject configurations the bridge cannot run with
    pub fn validate(&self) -> BridgeResult<()> {
        if self.url.is_empty() {
            return Err(BridgeError::Config("Command source URL is required".to_string()));
        }

        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(BridgeError::Config(format!(
                "Command source URL must use ws:// or wss://, got {}",
                self.url
            )));
        }

        if self.debounce_ms == 0 {
            return Err(BridgeError::Config("Debounce window must be positive".to_string()));
        }

        Ok(())
    }

    /// Debounce window as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Manual reconnect pause as a duration
    pub fn manual_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.manual_reconnect_delay_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_cap_attempts: default_reconnect_cap_attempts(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            debounce_ms: default_debounce_ms(),
            manual_reconnect_delay_ms: default_manual_reconnect_delay_ms(),
            dangling_edges: EdgePolicy::default(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn defaults_match_client_timing() {
        let config = BridgeConfig::default();
        assert_eq!(config.url, "ws://localhost:3001");
        assert_eq!(config.reconnect_base_delay_ms, 3000);
        assert_eq!(config.reconnect_cap_attempts, 5);
        assert_eq!(config.reconnect_max_delay_ms, 15_000);
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.dangling_edges, EdgePolicy::Permissive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = BridgeConfig {
            url: "http://localhost:3001".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));

        let config = BridgeConfig {
            url: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));

        let config = BridgeConfig {
            debounce_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"url":"wss://example.test/canvas","dangling_edges":"reject"}"#)
                .unwrap();
        assert_eq!(config.url, "wss://example.test/canvas");
        assert_eq!(config.dangling_edges, EdgePolicy::Reject);
        assert_eq!(config.debounce_ms, 500);
    }

    #[test]
    fn invalid_env_values_keep_the_default() {
        env::set_var("CANVAS_BRIDGE_TEST_PARSE_OK", "42");
        env::set_var("CANVAS_BRIDGE_TEST_PARSE_BAD", "forty-two");

        let mut ok = 1u64;
        let mut bad = 7u64;
        let mut missing = 9u32;
        parse_env("CANVAS_BRIDGE_TEST_PARSE_OK", &mut ok);
        parse_env("CANVAS_BRIDGE_TEST_PARSE_BAD", &mut bad);
        parse_env("CANVAS_BRIDGE_TEST_PARSE_MISSING", &mut missing);

        assert_eq!((ok, bad, missing), (42, 7, 9));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn invalid_env_values_are_logged_once_logging_is_up() {
        env::set_var("CANVAS_BRIDGE_TEST_WARN_BAD", "soon");

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut value = 3u64;
        tracing::subscriber::with_default(subscriber, || {
            parse_env("CANVAS_BRIDGE_TEST_WARN_BAD", &mut value);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(value, 3);
        assert!(output.contains("WARN"), "{}", output);
        assert!(output.contains("Invalid CANVAS_BRIDGE_TEST_WARN_BAD value: soon"), "{}", output);
    }
}
