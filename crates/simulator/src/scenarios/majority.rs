//! Majority filtering: receivers keep a value only when a strict majority of
//! senders agree on it.

use super::{party_ids, ScenarioOutcome};
use crate::{SimulatorConfig, SimulatorError};
use mpcsim_core::{Envelope, Message, PartyId};
use mpcsim_network::{Context, Network, Protocol, ProtocolError};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote(pub u64);

impl Message for Vote {
    type Key = ();

    fn key(&self) {}

    fn size(&self) -> usize {
        std::mem::size_of::<u64>()
    }
}

/// The value held by more than half of `votes`, if any.
pub fn strict_majority(votes: &[u64]) -> Option<u64> {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for &v in votes {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .find(|&(_, count)| 2 * count > votes.len())
        .map(|(value, _)| value)
}

pub struct MajorityFilter {
    value: u64,
    receivers: Vec<PartyId>,
    receiving: bool,
}

impl MajorityFilter {
    pub fn new(value: u64, receivers: Vec<PartyId>, receiving: bool) -> Self {
        Self {
            value,
            receivers,
            receiving,
        }
    }

    fn on_votes(
        &mut self,
        ctx: &mut Context<'_, Self>,
        votes: Vec<Envelope<Vote>>,
    ) -> Result<(), ProtocolError> {
        let values: Vec<u64> = votes.iter().map(|v| v.payload.0).collect();
        let decided = strict_majority(&values);
        debug!(party = %ctx.me(), votes = values.len(), ?decided, "Majority filter");
        ctx.complete(decided)
    }
}

impl Protocol for MajorityFilter {
    type Message = Vote;
    type Output = Option<u64>;

    fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
        if self.receiving {
            let n = ctx.peers().len();
            ctx.on_receive((), n, Self::on_votes)?;
        }
        let receivers = self.receivers.clone();
        ctx.broadcast_to(receivers, Vote(self.value))
    }

    fn produces_output(&self) -> bool {
        self.receiving
    }
}

pub fn run(config: &SimulatorConfig) -> Result<ScenarioOutcome, SimulatorError> {
    let ids = party_ids(config.parties);
    // Receivers: the first quorum-size parties, or everyone in small runs.
    let receivers: Vec<PartyId> = ids
        .iter()
        .copied()
        .take(config.quorum_size.clamp(1, config.parties))
        .collect();

    let mut network = Network::new(config.network.clone());
    for (index, &id) in ids.iter().enumerate() {
        // Corrupt senders each push a distinct wrong value.
        let value = if config.is_corrupt(index) {
            config.secret.wrapping_add(1 + index as u64)
        } else {
            config.secret
        };
        let protocol = MajorityFilter::new(value, receivers.clone(), receivers.contains(&id));
        network.add_party(id, protocol)?;
    }
    let report = network.run()?;

    let outputs = receivers
        .iter()
        .map(|&id| (id, network.output(id).copied().flatten()))
        .collect();
    Ok(ScenarioOutcome {
        expected: config.secret,
        outputs,
        traffic: network.traffic_report(),
        network: report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scenario;

    #[test]
    fn test_strict_majority() {
        assert_eq!(strict_majority(&[1, 1, 2]), Some(1));
        assert_eq!(strict_majority(&[1, 1, 2, 2]), None);
        assert_eq!(strict_majority(&[3]), Some(3));
        assert_eq!(strict_majority(&[]), None);
    }

    #[test]
    fn test_receivers_filter_out_minority() {
        let config = SimulatorConfig::new(Scenario::MajorityFilter, 9)
            .with_corrupt(4)
            .with_quorums(1, 3);
        let outcome = run(&config).unwrap();
        assert_eq!(outcome.outputs.len(), 3);
        assert!(outcome.outputs.values().all(|v| *v == Some(26)));
        // Nine senders to three receivers.
        assert_eq!(outcome.network.messages_sent, 27);
        assert!(outcome.network.all_completed());
    }
}
