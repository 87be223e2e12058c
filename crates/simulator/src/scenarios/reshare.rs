//! Resharing a secret from one quorum to another.
//!
//! Members of the source quorum hold Shamir shares of the secret. Each deals
//! a fresh sharing of its share to the destination quorum. Destination
//! members combine the sub-shares with the source points' Lagrange
//! coefficients, which yields shares of the same secret under a new
//! polynomial, then open them among themselves to check the result.
//!
//! Every party hosts one session per quorum it belongs to through a
//! [`Multiplexer`].

use super::{dealer_rng, party_ids, point_of, ScenarioOutcome};
use crate::{SimulatorConfig, SimulatorError};
use mpcsim_core::{generate_quorums, Envelope, Message, PartyId};
use mpcsim_field::Zp;
use mpcsim_network::{Context, Multiplexer, Network, Protocol, ProtocolError};
use mpcsim_sharing::{combine_reshares, contiguous_points, recombine, reshare, share, Share};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::debug;

/// Index of the quorum holding the secret.
pub const SOURCE: usize = 0;
/// Index of the quorum receiving it.
pub const DESTINATION: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReshareStage {
    SubShare,
    Open,
}

#[derive(Debug, Clone)]
pub enum ReshareMessage {
    /// A sharing of the sender's source share, tagged with its source point.
    SubShare { source_point: Zp, value: Zp },
    /// A destination member's new share, opened for verification.
    Open(Zp),
}

impl Message for ReshareMessage {
    type Key = ReshareStage;

    fn key(&self) -> ReshareStage {
        match self {
            ReshareMessage::SubShare { .. } => ReshareStage::SubShare,
            ReshareMessage::Open(_) => ReshareStage::Open,
        }
    }

    fn size(&self) -> usize {
        match self {
            ReshareMessage::SubShare { .. } => 1 + 2 * std::mem::size_of::<u64>(),
            ReshareMessage::Open(_) => 1 + std::mem::size_of::<u64>(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ReshareMessage::SubShare { .. } => "SubShare",
            ReshareMessage::Open(_) => "Open",
        }
    }
}

/// What a party does inside one quorum.
pub enum Reshare {
    Source { share: Share, degree: usize },
    Destination { prime: u64, degree: usize },
}

impl Reshare {
    fn on_sub_shares(
        &mut self,
        ctx: &mut Context<'_, Self>,
        subs: Vec<Envelope<ReshareMessage>>,
    ) -> Result<(), ProtocolError> {
        let Reshare::Destination { prime, degree } = *self else {
            return Err(ProtocolError::Failed("source received sub-shares".into()));
        };
        let pairs: Vec<(Zp, Zp)> = subs
            .iter()
            .filter_map(|e| match e.payload {
                ReshareMessage::SubShare {
                    source_point,
                    value,
                } => Some((source_point, value)),
                ReshareMessage::Open(_) => None,
            })
            .collect();
        let mine = combine_reshares(&pairs, degree)?;
        debug!(party = %ctx.me(), group = %ctx.group(), sources = pairs.len(), "Combined sub-shares");

        let members = ctx.peers().len();
        ctx.on_receive(ReshareStage::Open, members, move |_: &mut Reshare, ctx, opened| {
            let shares = opened
                .iter()
                .map(|e| match e.payload {
                    ReshareMessage::Open(v) => Ok(Share::new(point_of(ctx.peers(), e.sender, prime)?, v)),
                    ReshareMessage::SubShare { .. } => {
                        Err(ProtocolError::Failed("sub-share under the open stage".into()))
                    }
                })
                .collect::<Result<Vec<_>, ProtocolError>>()?;
            let secret = recombine(&shares, degree, prime)?;
            ctx.complete(Some(secret))
        })?;
        ctx.broadcast(ReshareMessage::Open(mine))
    }
}

impl Protocol for Reshare {
    type Message = ReshareMessage;
    type Output = Option<Zp>;

    fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
        match self {
            Reshare::Source { share, degree } => {
                let destination = ctx.quorum(DESTINATION)?;
                let points = contiguous_points(share.value.prime(), destination.size());
                let subs = reshare(share, &points, *degree, ctx.rng())?;
                let messages = subs
                    .into_iter()
                    .map(|sub| ReshareMessage::SubShare {
                        source_point: share.point,
                        value: sub.value,
                    })
                    .collect();
                ctx.quorum_send(messages, DESTINATION)?;
                ctx.complete(None)
            }
            Reshare::Destination { .. } => {
                let sources: Vec<PartyId> = ctx.quorum(SOURCE)?.members().collect();
                ctx.on_receive_from(ReshareStage::SubShare, sources, Self::on_sub_shares)
            }
        }
    }

    fn produces_output(&self) -> bool {
        matches!(self, Reshare::Destination { .. })
    }
}

pub fn run(config: &SimulatorConfig) -> Result<ScenarioOutcome, SimulatorError> {
    let ids = party_ids(config.parties);
    let mut quorum_rng = ChaCha8Rng::seed_from_u64(config.network.seed);
    let quorums = generate_quorums(&ids, config.quorum_count, config.quorum_size, &mut quorum_rng)?;
    let (Some(source), Some(destination)) = (quorums.get(SOURCE), quorums.get(DESTINATION)) else {
        return Err(SimulatorError::InvalidConfig(
            "resharing needs a source and a destination quorum".into(),
        ));
    };

    let secret = Zp::new(config.prime, config.secret);
    let dealt = share(secret, source.size(), config.degree, &mut dealer_rng(config.network.seed))?;
    let source_shares: BTreeMap<PartyId, Share> = source.members().zip(dealt).collect();

    let mut network = Network::new(config.network.clone());
    for &id in &ids {
        let mut roles = Vec::new();
        if let Some(share) = source_shares.get(&id) {
            let role = Reshare::Source {
                share: share.clone(),
                degree: config.degree,
            };
            roles.push((source.clone(), role));
        }
        if destination.contains(id) {
            let role = Reshare::Destination {
                prime: config.prime,
                degree: config.degree,
            };
            roles.push((destination.clone(), role));
        }
        network.add_party_in(id, Multiplexer::new(roles), quorums.clone())?;
    }
    let report = network.run()?;

    let outputs = destination
        .members()
        .map(|id| {
            let recovered = network
                .output(id)
                .and_then(|by_group| by_group.get(&destination.id()))
                .copied()
                .flatten()
                .map(|z| z.value());
            (id, recovered)
        })
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
    fn test_destination_recovers_the_secret() {
        let config = SimulatorConfig::new(Scenario::QuorumReshare, 8)
            .with_quorums(2, 5)
            .with_degree(2)
            .with_secret(4321)
            .with_seed(3);
        let outcome = run(&config).unwrap();
        assert_eq!(outcome.outputs.len(), 5);
        assert!(outcome.outputs.values().all(|v| *v == Some(4321)));
        assert!(outcome.network.all_completed(), "{:?}", outcome.network.diagnostics);
        // Five sources send five sub-shares each; five members open to five.
        assert_eq!(outcome.network.messages_sent, 25 + 25);
    }

    #[test]
    fn test_exact_quorum_cover_runs() {
        let config = SimulatorConfig::new(Scenario::QuorumReshare, 30)
            .with_quorums(10, 3)
            .with_degree(1)
            .with_corrupt(0)
            .with_seed(30);
        config.validate().unwrap();
        let outcome = run(&config).unwrap();
        assert_eq!(outcome.outputs.len(), 3);
        assert!(outcome.outputs.values().all(|v| *v == Some(config.secret)));
        assert_eq!(outcome.network.messages_sent, 9 + 9);
    }
}
