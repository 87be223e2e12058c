//! Scenario configuration.

use crate::SimulatorError;
use mpcsim_field::numtheory::is_prime;
use mpcsim_network::NetworkConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which reference scenario to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Every party shares an input; the total is reconstructed with
    /// error correction.
    #[default]
    SecretSum,
    /// Receivers keep the value a strict majority of senders agree on.
    MajorityFilter,
    /// A source quorum reshares a secret to a destination quorum.
    QuorumReshare,
    /// Parties refresh their shares with sharings of zero.
    ShareRenewal,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::SecretSum,
        Scenario::MajorityFilter,
        Scenario::QuorumReshare,
        Scenario::ShareRenewal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::SecretSum => "secret_sum",
            Scenario::MajorityFilter => "majority_filter",
            Scenario::QuorumReshare => "quorum_reshare",
            Scenario::ShareRenewal => "share_renewal",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == normalized)
            .ok_or_else(|| SimulatorError::UnknownScenario(s.to_string()))
    }
}

/// Configuration for one scenario run.
///
/// Loaded from TOML; every field has a default, and `[network]` nests a
/// [`NetworkConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub scenario: Scenario,
    pub parties: usize,
    pub prime: u64,
    /// Degree of every sharing polynomial.
    pub degree: usize,
    /// The secret, or the base input for `secret_sum`.
    pub secret: u64,
    /// Parties that misbehave. The highest party ids are chosen.
    pub corrupt: usize,
    pub quorum_count: usize,
    pub quorum_size: usize,
    pub network: NetworkConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            parties: 7,
            prime: 7919,
            degree: 2,
            secret: 26,
            corrupt: 1,
            quorum_count: 2,
            quorum_size: 5,
            network: NetworkConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn new(scenario: Scenario, parties: usize) -> Self {
        Self {
            scenario,
            parties,
            ..Self::default()
        }
    }

    pub fn with_prime(mut self, prime: u64) -> Self {
        self.prime = prime;
        self
    }

    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    pub fn with_secret(mut self, secret: u64) -> Self {
        self.secret = secret;
        self
    }

    pub fn with_corrupt(mut self, corrupt: usize) -> Self {
        self.corrupt = corrupt;
        self
    }

    pub fn with_quorums(mut self, count: usize, size: usize) -> Self {
        self.quorum_count = count;
        self.quorum_size = size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.network.seed = seed;
        self
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Whether party `index` (0-based) misbehaves.
    pub fn is_corrupt(&self, index: usize) -> bool {
        index >= self.parties.saturating_sub(self.corrupt)
    }

    /// Check the parameters the chosen scenario depends on.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        let invalid = |msg: String| Err(SimulatorError::InvalidConfig(msg));
        if !is_prime(self.prime) {
            return invalid(format!("{} is not prime", self.prime));
        }
        if self.prime <= self.parties as u64 {
            return invalid(format!(
                "prime {} leaves no distinct evaluation point for each of {} parties",
                self.prime, self.parties
            ));
        }
        if self.parties <= self.degree {
            return invalid(format!(
                "{} parties cannot hold a degree-{} sharing",
                self.parties, self.degree
            ));
        }
        if self.corrupt > self.parties {
            return invalid(format!(
                "{} corrupt parties out of {}",
                self.corrupt, self.parties
            ));
        }
        match self.scenario {
            Scenario::SecretSum => {
                let needed = self.degree + 1 + 2 * self.corrupt;
                if self.parties < needed {
                    return invalid(format!(
                        "correcting {} errors at degree {} needs {} parties, have {}",
                        self.corrupt, self.degree, needed, self.parties
                    ));
                }
            }
            Scenario::MajorityFilter => {
                if 2 * self.corrupt >= self.parties {
                    return invalid(format!(
                        "{} corrupt parties out of {} leave no honest majority",
                        self.corrupt, self.parties
                    ));
                }
            }
            Scenario::QuorumReshare => {
                if self.quorum_count < 2 {
                    return invalid("resharing needs a source and a destination quorum".into());
                }
                if self.quorum_size <= self.degree || self.quorum_size > self.parties {
                    return invalid(format!(
                        "quorum size {} must exceed the degree {} and fit in {} parties",
                        self.quorum_size, self.degree, self.parties
                    ));
                }
                let Some(seats) = self.quorum_count.checked_mul(self.quorum_size) else {
                    return invalid(format!(
                        "{} quorums of {} overflow the seat count",
                        self.quorum_count, self.quorum_size
                    ));
                };
                if seats < self.parties {
                    return invalid(format!(
                        "{} quorums of {} cannot cover {} parties",
                        self.quorum_count, self.quorum_size, self.parties
                    ));
                }
            }
            Scenario::ShareRenewal => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpcsim_network::ExecutionModel;

    #[test]
    fn test_scenario_from_str() {
        assert_eq!("secret-sum".parse::<Scenario>().unwrap(), Scenario::SecretSum);
        assert_eq!(
            "Quorum_Reshare".parse::<Scenario>().unwrap(),
            Scenario::QuorumReshare
        );
        assert!("consensus".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_toml_with_nested_network() {
        let config: SimulatorConfig = toml::from_str(
            r#"
            scenario = "majority_filter"
            parties = 9
            corrupt = 4

            [network]
            seed = 5
            model = { kind = "asynchronous", max_jitter = 3 }
            "#,
        )
        .unwrap();
        assert_eq!(config.scenario, Scenario::MajorityFilter);
        assert_eq!(config.prime, 7919);
        assert_eq!(config.network.seed, 5);
        assert_eq!(
            config.network.model,
            ExecutionModel::Asynchronous { max_jitter: 3 }
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_validation() {
        assert!(SimulatorConfig::default().validate().is_ok());
        assert!(SimulatorConfig::default().with_prime(7917).validate().is_err());
        assert!(SimulatorConfig::new(Scenario::SecretSum, 5)
            .with_corrupt(1)
            .validate()
            .is_ok());
        assert!(SimulatorConfig::new(Scenario::SecretSum, 5)
            .with_corrupt(2)
            .validate()
            .is_err());
        assert!(SimulatorConfig::new(Scenario::MajorityFilter, 4)
            .with_degree(1)
            .with_corrupt(2)
            .validate()
            .is_err());
        assert!(SimulatorConfig::new(Scenario::QuorumReshare, 12)
            .with_quorums(2, 5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_overflowing_quorum_seats_are_invalid() {
        let config = SimulatorConfig::new(Scenario::QuorumReshare, 8).with_quorums(usize::MAX, 5);
        assert!(matches!(
            config.validate(),
            Err(SimulatorError::InvalidConfig(msg)) if msg.contains("overflow")
        ));
    }

    #[test]
    fn test_corrupt_parties_are_the_highest_ids() {
        let config = SimulatorConfig::new(Scenario::SecretSum, 7).with_corrupt(2);
        let corrupt: Vec<usize> = (0..7).filter(|&i| config.is_corrupt(i)).collect();
        assert_eq!(corrupt, vec![5, 6]);
    }
}
