//! Parties as simulation entities.

use crate::protocol::{Protocol, Transport};
use crate::session::Session;
use crate::{ExecutionModel, NetworkConfig, ProtocolError, TrafficAnalyzer};
use mpcsim_core::{Envelope, Message, PartyId};
use mpcsim_simulation::{Delay, Entity, EntityId, Scheduler, SimTime};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Per-party seed: `seed.wrapping_add(id).wrapping_mul(0x517cc1b727220a95)`.
pub fn party_seed(seed: u64, party: PartyId) -> u64 {
    seed.wrapping_add(u64::from(party.0))
        .wrapping_mul(0x517cc1b727220a95)
}

/// State every delivery closure needs, shared read-only across parties.
pub(crate) struct Shared {
    pub directory: BTreeMap<PartyId, EntityId>,
    pub traffic: Arc<TrafficAnalyzer>,
    pub config: NetworkConfig,
}

/// A simulated endpoint running one root session.
pub struct Party<P: Protocol> {
    id: PartyId,
    session: Session<P>,
    /// Protocol randomness.
    rng: ChaCha8Rng,
    /// Delivery jitter; kept apart so jitter never shifts protocol draws.
    net_rng: ChaCha8Rng,
}

impl<P: Protocol> Entity for Party<P> {
    type Error = ProtocolError;
}

impl<P: Protocol> Party<P> {
    pub(crate) fn new(id: PartyId, session: Session<P>, seed: u64) -> Self {
        let seed = party_seed(seed, id);
        Self {
            id,
            session,
            rng: ChaCha8Rng::seed_from_u64(seed),
            net_rng: ChaCha8Rng::seed_from_u64(seed.rotate_left(32)),
        }
    }

    pub fn id(&self) -> PartyId {
        self.id
    }

    pub fn session(&self) -> &Session<P> {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session<P> {
        &mut self.session
    }

    pub(crate) fn start(
        &mut self,
        scheduler: &Scheduler<Party<P>>,
        shared: &Arc<Shared>,
    ) -> Result<(), ProtocolError> {
        trace!(party = %self.id, time = scheduler.now(), "Starting session");
        let mut transport = PartyTransport {
            me: self.id,
            scheduler,
            shared,
            net_rng: &mut self.net_rng,
        };
        self.session.start(&mut transport, &mut self.rng)
    }

    pub(crate) fn deliver(
        &mut self,
        envelope: Envelope<P::Message>,
        scheduler: &Scheduler<Party<P>>,
        shared: &Arc<Shared>,
    ) -> Result<(), ProtocolError> {
        shared.traffic.record_receive(self.id, envelope.size());
        let mut transport = PartyTransport {
            me: self.id,
            scheduler,
            shared,
            net_rng: &mut self.net_rng,
        };
        self.session.handle(envelope, &mut transport, &mut self.rng)
    }
}

/// Transport backed by the simulation scheduler.
struct PartyTransport<'s, P: Protocol> {
    me: PartyId,
    scheduler: &'s Scheduler<Party<P>>,
    shared: &'s Arc<Shared>,
    net_rng: &'s mut ChaCha8Rng,
}

impl<P: Protocol> PartyTransport<'_, P> {
    fn delay(&mut self, extra: Delay) -> Delay {
        let config = &self.shared.config;
        match config.model {
            ExecutionModel::Synchronous { round_length } => {
                Delay::ticks(round_length.saturating_mul(1 + extra.as_ticks()))
            }
            ExecutionModel::Asynchronous { max_jitter } => {
                let jitter = if max_jitter > 0 {
                    self.net_rng.gen_range(0..=max_jitter)
                } else {
                    0
                };
                Delay::ticks(config.base_delay) + extra + Delay::ticks(jitter)
            }
        }
    }
}

impl<P: Protocol> Transport<P::Message> for PartyTransport<'_, P> {
    fn me(&self) -> PartyId {
        self.me
    }

    fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    fn round_length(&self) -> Option<u64> {
        self.shared.config.round_length()
    }

    fn dispatch(
        &mut self,
        envelope: Envelope<P::Message>,
        extra: Delay,
    ) -> Result<(), ProtocolError> {
        let target = *self
            .shared
            .directory
            .get(&envelope.recipient)
            .ok_or(ProtocolError::UnknownParty(envelope.recipient))?;
        let delay = self.delay(extra);
        trace!(
            from = %envelope.sender,
            to = %envelope.recipient,
            group = %envelope.group,
            kind = envelope.payload.kind(),
            delay = delay.as_ticks(),
            "Dispatch"
        );
        let shared = Arc::clone(self.shared);
        self.scheduler
            .schedule(target, delay, move |party: &mut Party<P>, scheduler| {
                party.deliver(envelope, scheduler, &shared)
            });
        Ok(())
    }

    fn traffic(&self) -> &TrafficAnalyzer {
        &self.shared.traffic
    }

    fn charges_agreement(&self) -> bool {
        self.shared.config.reliable_broadcast_accounting
    }

    fn halt(&self) {
        self.scheduler.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_seed_matches_fixture_derivation() {
        for id in 0..8u32 {
            assert_eq!(
                party_seed(42, PartyId(id)),
                mpcsim_test_helpers::party_seed(42, u64::from(id))
            );
        }
        assert_ne!(party_seed(42, PartyId(0)), party_seed(42, PartyId(1)));
    }
}
