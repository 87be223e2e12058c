//! Secure sum with error-corrected reconstruction.
//!
//! Every party Shamir-shares its input, adds up the shares it receives, and
//! broadcasts that sum share. The total is recovered with Welch-Berlekamp, so
//! up to `max_errors` parties may broadcast garbage.

use super::{party_ids, point_of, ScenarioOutcome};
use crate::{SimulatorConfig, SimulatorError};
use mpcsim_core::{Envelope, Message, PartyId};
use mpcsim_field::Zp;
use mpcsim_network::{Context, Network, Protocol, ProtocolError};
use mpcsim_sharing::{robust_recombine, share, Share};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SumStage {
    Input,
    Output,
}

#[derive(Debug, Clone)]
pub enum SumMessage {
    /// A share of the sender's input.
    InputShare(Zp),
    /// The sender's share of the total.
    SumShare(Zp),
}

impl Message for SumMessage {
    type Key = SumStage;

    fn key(&self) -> SumStage {
        match self {
            SumMessage::InputShare(_) => SumStage::Input,
            SumMessage::SumShare(_) => SumStage::Output,
        }
    }

    fn size(&self) -> usize {
        // Tag plus one field element.
        1 + std::mem::size_of::<u64>()
    }

    fn kind(&self) -> &'static str {
        match self {
            SumMessage::InputShare(_) => "InputShare",
            SumMessage::SumShare(_) => "SumShare",
        }
    }
}

fn value_of(envelope: &Envelope<SumMessage>) -> Zp {
    match envelope.payload {
        SumMessage::InputShare(v) | SumMessage::SumShare(v) => v,
    }
}

pub struct SecretSum {
    input: Zp,
    degree: usize,
    max_errors: usize,
    /// Broadcast a wrong sum share.
    corrupt: bool,
}

impl SecretSum {
    pub fn new(input: Zp, degree: usize, max_errors: usize, corrupt: bool) -> Self {
        Self {
            input,
            degree,
            max_errors,
            corrupt,
        }
    }

    fn on_inputs(
        &mut self,
        ctx: &mut Context<'_, Self>,
        shares: Vec<Envelope<SumMessage>>,
    ) -> Result<(), ProtocolError> {
        let prime = self.input.prime();
        let mut sum = shares
            .iter()
            .map(value_of)
            .fold(Zp::zero(prime), |acc, v| acc + v);
        if self.corrupt {
            let offset = ctx.rng().gen_range(1..prime);
            sum += Zp::new(prime, offset);
        }
        let n = ctx.peers().len();
        ctx.on_receive(SumStage::Output, n, Self::on_sums)?;
        ctx.broadcast(SumMessage::SumShare(sum))
    }

    fn on_sums(
        &mut self,
        ctx: &mut Context<'_, Self>,
        sums: Vec<Envelope<SumMessage>>,
    ) -> Result<(), ProtocolError> {
        let prime = self.input.prime();
        let shares = sums
            .iter()
            .map(|e| Ok(Share::new(point_of(ctx.peers(), e.sender, prime)?, value_of(e))))
            .collect::<Result<Vec<_>, ProtocolError>>()?;
        let total = robust_recombine(&shares, self.max_errors, self.degree, prime)?;
        match total {
            Some(total) => debug!(party = %ctx.me(), total = total.value(), "Recovered sum"),
            None => warn!(party = %ctx.me(), "Sum shares could not be decoded"),
        }
        ctx.complete(total)
    }
}

impl Protocol for SecretSum {
    type Message = SumMessage;
    type Output = Option<Zp>;

    fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
        let peers = ctx.peers().to_vec();
        let shares = share(self.input, peers.len(), self.degree, ctx.rng())?;
        ctx.on_receive(SumStage::Input, peers.len(), Self::on_inputs)?;
        for (peer, share) in peers.into_iter().zip(shares) {
            ctx.send(peer, SumMessage::InputShare(share.value))?;
        }
        Ok(())
    }
}

/// Input of party `index`: `secret + index`.
fn input_of(config: &SimulatorConfig, index: usize) -> Zp {
    Zp::new(config.prime, config.secret.wrapping_add(index as u64))
}

pub fn run(config: &SimulatorConfig) -> Result<ScenarioOutcome, SimulatorError> {
    let mut network = Network::new(config.network.clone());
    for (index, id) in party_ids(config.parties).into_iter().enumerate() {
        let protocol = SecretSum::new(
            input_of(config, index),
            config.degree,
            config.corrupt,
            config.is_corrupt(index),
        );
        network.add_party(id, protocol)?;
    }
    let report = network.run()?;

    let expected = (0..config.parties)
        .map(|i| input_of(config, i))
        .fold(Zp::zero(config.prime), |acc, v| acc + v);
    let outputs: BTreeMap<PartyId, Option<u64>> = network
        .party_ids()
        .map(|id| {
            let value = network.output(id).copied().flatten().map(|z| z.value());
            (id, value)
        })
        .collect();
    Ok(ScenarioOutcome {
        expected: expected.value(),
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
    fn test_sum_survives_corrupt_parties() {
        let config = SimulatorConfig::new(Scenario::SecretSum, 7)
            .with_degree(2)
            .with_corrupt(2)
            .with_seed(9);
        let outcome = run(&config).unwrap();
        assert_eq!(outcome.expected, (26..33).sum::<u64>());
        assert_eq!(outcome.outputs.len(), 7);
        assert!(outcome
            .outputs
            .values()
            .all(|v| *v == Some(outcome.expected)));
    }

    #[test]
    fn test_every_party_sends_two_rounds() {
        let config = SimulatorConfig::new(Scenario::SecretSum, 4)
            .with_degree(1)
            .with_corrupt(0);
        let outcome = run(&config).unwrap();
        assert_eq!(outcome.network.messages_sent, 2 * 4 * 4);
        assert_eq!(outcome.network.bytes_sent, 2 * 4 * 4 * 9);
        assert!(outcome.network.diagnostics.is_empty());
    }
}
