//! Network configuration.

use mpcsim_simulation::{DriverKind, SimTime};
use serde::{Deserialize, Serialize};

/// How message delays are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionModel {
    /// Lockstep rounds: every message arrives exactly `round_length` ticks
    /// after it was sent (plus whole rounds for an explicit extra delay).
    Synchronous { round_length: u64 },
    /// Messages take the base delay plus any explicit extra delay, plus a
    /// uniform jitter in `0..=max_jitter` drawn from the sender's network RNG.
    Asynchronous {
        #[serde(default)]
        max_jitter: u64,
    },
}

impl Default for ExecutionModel {
    fn default() -> Self {
        ExecutionModel::Asynchronous { max_jitter: 0 }
    }
}

/// Configuration for a simulated network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Root seed; every party derives its RNGs from it.
    pub seed: u64,
    /// Ticks added to every asynchronous message.
    pub base_delay: u64,
    pub model: ExecutionModel,
    pub driver: DriverKind,
    /// Stop once the clock would pass this time.
    pub deadline: Option<SimTime>,
    /// Charge reliable broadcasts for the agreement traffic they imply.
    pub reliable_broadcast_accounting: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            base_delay: 1,
            model: ExecutionModel::default(),
            driver: DriverKind::Sequential,
            deadline: None,
            reliable_broadcast_accounting: true,
        }
    }
}

impl NetworkConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_base_delay(mut self, ticks: u64) -> Self {
        self.base_delay = ticks;
        self
    }

    pub fn with_model(mut self, model: ExecutionModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_driver(mut self, driver: DriverKind) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_deadline(mut self, deadline: SimTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_reliable_broadcast_accounting(mut self, enabled: bool) -> Self {
        self.reliable_broadcast_accounting = enabled;
        self
    }

    /// Round length under the synchronous model.
    pub fn round_length(&self) -> Option<u64> {
        match self.model {
            ExecutionModel::Synchronous { round_length } => Some(round_length),
            ExecutionModel::Asynchronous { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NetworkConfig = toml::from_str(
            r#"
            seed = 7
            model = { kind = "synchronous", round_length = 4 }
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.base_delay, 1);
        assert_eq!(config.round_length(), Some(4));
        assert_eq!(config.driver, DriverKind::Sequential);
    }

    #[test]
    fn test_builder() {
        let config = NetworkConfig::default()
            .with_seed(3)
            .with_driver(DriverKind::Parallel { threads: Some(2) })
            .with_deadline(100);
        assert_eq!(config.deadline, Some(100));
        assert_eq!(config.round_length(), None);
    }
}
