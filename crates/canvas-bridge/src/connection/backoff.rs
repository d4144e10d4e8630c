use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::BridgeConfig;

/// Linear reconnect backoff with a plateau.
///
/// `delay(n) = min(base * min(n, cap_attempts), max_delay)`; there is no
/// jitter and no retry limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Delay unit
    pub base_delay: Duration,
    /// Attempt count after which the delay stops growing
    pub cap_attempts: u32,
    /// Upper bound on any delay
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = attempt.min(self.cap_attempts);
        (self.base_delay * factor).min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(3000),
            cap_attempts: 5,
            max_delay: Duration::from_millis(15_000),
        }
    }
}

impl From<&BridgeConfig> for ReconnectPolicy {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.reconnect_base_delay_ms),
            cap_attempts: config.reconnect_cap_attempts,
            max_delay: Duration::from_millis(config.reconnect_max_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_linearly_then_plateaus() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u128> = (1..=8).map(|n| policy.delay(n).as_millis()).collect();
        assert_eq!(delays, vec![3000, 6000, 9000, 12000, 15000, 15000, 15000, 15000]);
    }

    #[test]
    fn max_delay_bounds_the_plateau() {
        let policy = ReconnectPolicy {
            base_delay: Duration::from_millis(1000),
            cap_attempts: 10,
            max_delay: Duration::from_millis(2500),
        };
        assert_eq!(policy.delay(2), Duration::from_millis(2000));
        assert_eq!(policy.delay(3), Duration::from_millis(2500));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(2500));
    }

    #[test]
    fn builds_from_config() {
        let config = BridgeConfig {
            reconnect_base_delay_ms: 10,
            reconnect_cap_attempts: 2,
            reconnect_max_delay_ms: 100,
            ..Default::default()
        };
        let policy = ReconnectPolicy::from(&config);
        assert_eq!(policy.delay(5), Duration::from_millis(20));
    }
}
