//! Proactive share renewal.
//!
//! Parties start with dealt shares of a secret. Each deals a sharing of zero
//! and adds the updates it receives to its share, then the renewed shares are
//! opened to confirm the secret survived.

use super::{dealer_rng, party_ids, point_of, ScenarioOutcome};
use crate::{SimulatorConfig, SimulatorError};
use mpcsim_core::{Envelope, Message, PartyId};
use mpcsim_field::Zp;
use mpcsim_network::{Context, Network, Protocol, ProtocolError};
use mpcsim_sharing::{recombine, refresh_share, share, zero_sharing, Share};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenewalStage {
    Update,
    Open,
}

#[derive(Debug, Clone)]
pub struct RenewalMessage {
    pub stage: RenewalStage,
    pub value: Zp,
}

impl Message for RenewalMessage {
    type Key = RenewalStage;

    fn key(&self) -> RenewalStage {
        self.stage
    }

    fn size(&self) -> usize {
        1 + std::mem::size_of::<u64>()
    }

    fn kind(&self) -> &'static str {
        match self.stage {
            RenewalStage::Update => "ZeroUpdate",
            RenewalStage::Open => "Open",
        }
    }
}

/// What a party reports after renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renewed {
    pub secret: Zp,
    /// Whether the party's share actually moved.
    pub share_changed: bool,
}

pub struct ShareRenewal {
    share: Share,
    degree: usize,
    renewed: Option<Share>,
}

impl ShareRenewal {
    pub fn new(share: Share, degree: usize) -> Self {
        Self {
            share,
            degree,
            renewed: None,
        }
    }

    fn on_updates(
        &mut self,
        ctx: &mut Context<'_, Self>,
        updates: Vec<Envelope<RenewalMessage>>,
    ) -> Result<(), ProtocolError> {
        let values: Vec<Zp> = updates.iter().map(|e| e.payload.value).collect();
        let renewed = refresh_share(&self.share, &values);
        let opened = RenewalMessage {
            stage: RenewalStage::Open,
            value: renewed.value,
        };
        self.renewed = Some(renewed);
        let n = ctx.peers().len();
        ctx.on_receive(RenewalStage::Open, n, Self::on_open)?;
        ctx.broadcast(opened)
    }

    fn on_open(
        &mut self,
        ctx: &mut Context<'_, Self>,
        opened: Vec<Envelope<RenewalMessage>>,
    ) -> Result<(), ProtocolError> {
        let prime = self.share.value.prime();
        let shares = opened
            .iter()
            .map(|e| Ok(Share::new(point_of(ctx.peers(), e.sender, prime)?, e.payload.value)))
            .collect::<Result<Vec<_>, ProtocolError>>()?;
        let secret = recombine(&shares, self.degree, prime)?;
        let share_changed = self.renewed.as_ref() != Some(&self.share);
        ctx.complete(Renewed {
            secret,
            share_changed,
        })
    }
}

impl Protocol for ShareRenewal {
    type Message = RenewalMessage;
    type Output = Renewed;

    fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
        let peers = ctx.peers().to_vec();
        let prime = self.share.value.prime();
        let updates = zero_sharing(prime, peers.len(), self.degree, ctx.rng())?;
        ctx.on_receive(RenewalStage::Update, peers.len(), Self::on_updates)?;
        for (peer, update) in peers.into_iter().zip(updates) {
            let message = RenewalMessage {
                stage: RenewalStage::Update,
                value: update.value,
            };
            ctx.send(peer, message)?;
        }
        Ok(())
    }
}

pub fn run(config: &SimulatorConfig) -> Result<ScenarioOutcome, SimulatorError> {
    let ids = party_ids(config.parties);
    let secret = Zp::new(config.prime, config.secret);
    let dealt = share(secret, ids.len(), config.degree, &mut dealer_rng(config.network.seed))?;

    let mut network = Network::new(config.network.clone());
    for (&id, share) in ids.iter().zip(dealt) {
        network.add_party(id, ShareRenewal::new(share, config.degree))?;
    }
    let report = network.run()?;

    let outputs: BTreeMap<PartyId, Option<u64>> = ids
        .iter()
        .map(|&id| (id, network.output(id).map(|r| r.secret.value())))
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
    fn test_renewal_keeps_secret_and_moves_shares() {
        let config = SimulatorConfig::new(Scenario::ShareRenewal, 6)
            .with_degree(2)
            .with_secret(777)
            .with_seed(21);
        let ids = party_ids(6);
        let outcome = run(&config).unwrap();
        assert!(outcome.outputs.values().all(|v| *v == Some(777)));

        // Re-run to inspect the parties themselves.
        let secret = Zp::new(config.prime, config.secret);
        let dealt = share(secret, 6, 2, &mut dealer_rng(21)).unwrap();
        let mut network = Network::new(config.network.clone());
        for (&id, share) in ids.iter().zip(dealt) {
            network.add_party(id, ShareRenewal::new(share, 2)).unwrap();
        }
        network.run().unwrap();
        let moved = ids
            .iter()
            .filter(|&&id| network.output(id).is_some_and(|r| r.share_changed))
            .count();
        assert!(moved >= 5, "only {moved} shares changed");
    }
}
