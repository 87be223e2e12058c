//! Reference protocols and the networks that run them.

pub mod majority;
pub mod renewal;
pub mod reshare;
pub mod secret_sum;

use crate::{SimulatorConfig, SimulatorError};
use mpcsim_core::PartyId;
use mpcsim_field::Zp;
use mpcsim_network::{party_seed, BandwidthReport, NetworkReport, ProtocolError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Result of one scenario run before it is judged.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// Value every output-producing party should report.
    pub expected: u64,
    /// Reported value per party; `None` when a party could not decide.
    pub outputs: BTreeMap<PartyId, Option<u64>>,
    pub network: NetworkReport,
    pub traffic: BandwidthReport,
}

/// Evaluation point of `party`: its 1-based rank among `peers`.
pub(crate) fn point_of(peers: &[PartyId], party: PartyId, prime: u64) -> Result<Zp, ProtocolError> {
    peers
        .iter()
        .position(|&p| p == party)
        .map(|i| Zp::new(prime, i as u64 + 1))
        .ok_or(ProtocolError::UnknownParty(party))
}

pub(crate) fn party_ids(n: usize) -> Vec<PartyId> {
    (0..n as u32).map(PartyId).collect()
}

/// RNG for the trusted dealer that prepares initial sharings.
pub(crate) fn dealer_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(party_seed(seed, PartyId(u32::MAX)))
}

pub(crate) fn run(config: &SimulatorConfig) -> Result<ScenarioOutcome, SimulatorError> {
    use crate::Scenario;

    match config.scenario {
        Scenario::SecretSum => secret_sum::run(config),
        Scenario::MajorityFilter => majority::run(config),
        Scenario::QuorumReshare => reshare::run(config),
        Scenario::ShareRenewal => renewal::run(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_of_is_one_based_rank() {
        let peers = [PartyId(2), PartyId(5), PartyId(9)];
        assert_eq!(point_of(&peers, PartyId(5), 29).unwrap().value(), 2);
        assert_eq!(
            point_of(&peers, PartyId(4), 29),
            Err(ProtocolError::UnknownParty(PartyId(4)))
        );
    }
}
