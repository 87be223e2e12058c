//! The handle a protocol uses to talk to the network.

use crate::mailbox::{Admission, Expected};
use crate::protocol::{Protocol, SessionState, Transport};
use crate::session::{SessionCore, Waiter};
use crate::{Diagnostic, ProtocolError, AGREEMENT_OVERHEAD};
use mpcsim_core::{Envelope, GroupId, Message, PartyId, Quorum, VirtualId};
use mpcsim_simulation::{Delay, SimTime};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use tracing::warn;

type Key<P> = <<P as Protocol>::Message as Message>::Key;

/// Messages charged per recipient pair for one agreement instance.
const AGREEMENT_MESSAGES_PER_PAIR: u64 = 4;
/// Bytes charged per recipient pair for one agreement instance.
const AGREEMENT_BYTES_PER_PAIR: u64 = 1024;

/// Per-call view of a session: its collection state, the party's transport
/// and the party's RNG.
pub struct Context<'a, P: Protocol> {
    core: &'a mut SessionCore<P>,
    transport: &'a mut dyn Transport<P::Message>,
    rng: &'a mut ChaCha8Rng,
}

impl<'a, P: Protocol> Context<'a, P> {
    pub(crate) fn new(
        core: &'a mut SessionCore<P>,
        transport: &'a mut dyn Transport<P::Message>,
        rng: &'a mut ChaCha8Rng,
    ) -> Self {
        Self {
            core,
            transport,
            rng,
        }
    }

    pub fn me(&self) -> PartyId {
        self.transport.me()
    }

    /// Group this session runs in; [`GroupId::ROOT`] outside a multiplexer.
    pub fn group(&self) -> GroupId {
        self.core.group
    }

    /// Parties a plain `broadcast` reaches, including this one.
    pub fn peers(&self) -> &[PartyId] {
        &self.core.peers
    }

    pub fn quorums(&self) -> &[Quorum] {
        &self.core.quorums
    }

    pub fn quorum(&self, index: usize) -> Result<&Quorum, ProtocolError> {
        self.core
            .quorums
            .get(index)
            .ok_or(ProtocolError::UnknownQuorum {
                index,
                available: self.core.quorums.len(),
            })
    }

    pub fn now(&self) -> SimTime {
        self.transport.now()
    }

    /// Current round: `now / round_length` under the synchronous model, the
    /// raw clock otherwise.
    pub fn round(&self) -> u64 {
        let now = self.now();
        match self.transport.round_length() {
            Some(len) if len > 0 => now / len,
            _ => now,
        }
    }

    /// The party's seeded RNG. Protocols draw all randomness from here.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        self.rng
    }

    pub fn send(&mut self, to: PartyId, message: P::Message) -> Result<(), ProtocolError> {
        self.send_delayed(to, message, Delay::ZERO)
    }

    /// Send with `delay` on top of the execution model's delay.
    pub fn send_delayed(
        &mut self,
        to: PartyId,
        message: P::Message,
        delay: Delay,
    ) -> Result<(), ProtocolError> {
        let group = self.core.group;
        self.transport
            .traffic()
            .record_send(self.me(), message.kind(), 1, message.size());
        self.dispatch(group, to, message, delay)
    }

    /// Send to one party's session inside a specific group.
    pub fn send_virtual(&mut self, to: VirtualId, message: P::Message) -> Result<(), ProtocolError> {
        self.transport
            .traffic()
            .record_send(self.me(), message.kind(), 1, message.size());
        self.dispatch(to.group, to.party, message, Delay::ZERO)
    }

    /// Unicast `message` to every peer, this party included. Not
    /// Byzantine-consistent: a faulty sender may send different values by
    /// calling `send` instead.
    pub fn broadcast(&mut self, message: P::Message) -> Result<(), ProtocolError> {
        let peers = self.core.peers.clone();
        self.broadcast_to(peers, message)
    }

    pub fn broadcast_to(
        &mut self,
        recipients: impl IntoIterator<Item = PartyId>,
        message: P::Message,
    ) -> Result<(), ProtocolError> {
        let group = self.core.group;
        let recipients: Vec<PartyId> = recipients.into_iter().collect();
        self.fan_out(group, &recipients, message)
    }

    /// Broadcast charged with the traffic of a CKS-style agreement round:
    /// `4k²` messages and `1024k²` bytes for `k` peers, unless disabled in
    /// the network configuration.
    pub fn reliable_broadcast(&mut self, message: P::Message) -> Result<(), ProtocolError> {
        let k = self.core.peers.len() as u64;
        self.broadcast(message)?;
        if self.transport.charges_agreement() {
            self.transport.traffic().record_overhead(
                self.me(),
                AGREEMENT_OVERHEAD,
                AGREEMENT_MESSAGES_PER_PAIR * k * k,
                AGREEMENT_BYTES_PER_PAIR * k * k,
            );
        }
        Ok(())
    }

    /// Send `message` to every member of quorum `index`, addressed to their
    /// session for that quorum.
    pub fn quorum_broadcast(
        &mut self,
        message: P::Message,
        index: usize,
    ) -> Result<(), ProtocolError> {
        let quorum = self.quorum(index)?;
        let group = quorum.id();
        let members: Vec<PartyId> = quorum.members().collect();
        self.fan_out(group, &members, message)
    }

    /// Send `messages[i]` to the member at position `i + 1` of quorum
    /// `index`.
    pub fn quorum_send(
        &mut self,
        messages: Vec<P::Message>,
        index: usize,
    ) -> Result<(), ProtocolError> {
        let quorum = self.quorum(index)?;
        if messages.len() != quorum.size() {
            return Err(ProtocolError::LengthMismatch {
                what: "quorum messages",
                expected: quorum.size(),
                actual: messages.len(),
            });
        }
        let group = quorum.id();
        let members: Vec<PartyId> = quorum.members().collect();
        for (to, message) in members.into_iter().zip(messages) {
            self.send_virtual(VirtualId::new(group, to), message)?;
        }
        Ok(())
    }

    fn fan_out(
        &mut self,
        group: GroupId,
        recipients: &[PartyId],
        message: P::Message,
    ) -> Result<(), ProtocolError> {
        self.transport.traffic().record_send(
            self.me(),
            message.kind(),
            recipients.len(),
            message.size(),
        );
        for &to in recipients {
            self.dispatch(group, to, message.clone(), Delay::ZERO)?;
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        group: GroupId,
        to: PartyId,
        payload: P::Message,
        delay: Delay,
    ) -> Result<(), ProtocolError> {
        let envelope = Envelope {
            sender: self.me(),
            recipient: to,
            group,
            sent_at: self.now(),
            payload,
        };
        self.transport.dispatch(envelope, delay)
    }

    /// Buffer an incoming envelope for stage-keyed collection.
    ///
    /// The first message per sender and key wins; later ones are reported.
    /// If the collection registered for the key is now satisfied, its
    /// continuation runs once the current handler returns.
    pub fn collect(&mut self, envelope: Envelope<P::Message>) {
        let key = envelope.key();
        let sender = envelope.sender;
        let expected = self.core.waiters.get(&key).map(|w| &w.expected);
        match self.core.mailbox.insert(envelope, expected) {
            Admission::Buffered { count } => {
                let satisfied = self
                    .core
                    .waiters
                    .get(&key)
                    .is_some_and(|w| count >= w.expected.required());
                if satisfied {
                    self.core.mark_ready(key);
                }
            }
            Admission::Duplicate => {
                let diagnostic = Diagnostic::DuplicateMessage {
                    party: self.me(),
                    group: self.core.group,
                    sender,
                    key: format!("{key:?}"),
                };
                self.report(diagnostic);
            }
            Admission::Unexpected => {
                let diagnostic = Diagnostic::UnexpectedSender {
                    party: self.me(),
                    group: self.core.group,
                    sender,
                    key: format!("{key:?}"),
                };
                self.report(diagnostic);
            }
        }
    }

    /// Run `continuation` once `threshold` distinct senders have sent a
    /// message tagged `key`. It receives exactly `threshold` envelopes
    /// ordered by sender; later arrivals start the next round.
    pub fn on_receive<F>(
        &mut self,
        key: Key<P>,
        threshold: usize,
        continuation: F,
    ) -> Result<(), ProtocolError>
    where
        F: FnOnce(&mut P, &mut Context<'_, P>, Vec<Envelope<P::Message>>) -> Result<(), ProtocolError>
            + Send
            + 'static,
    {
        self.register(key, Expected::Threshold(threshold), Box::new(continuation))
    }

    /// Like [`Context::on_receive`], waiting for exactly `senders`. Messages
    /// from anyone else under this key are reported and dropped.
    pub fn on_receive_from<F>(
        &mut self,
        key: Key<P>,
        senders: impl IntoIterator<Item = PartyId>,
        continuation: F,
    ) -> Result<(), ProtocolError>
    where
        F: FnOnce(&mut P, &mut Context<'_, P>, Vec<Envelope<P::Message>>) -> Result<(), ProtocolError>
            + Send
            + 'static,
    {
        let senders: BTreeSet<PartyId> = senders.into_iter().collect();
        self.register(key, Expected::Senders(senders), Box::new(continuation))
    }

    /// One lockstep round: send each `(to, message)` and collect the
    /// recipients' replies under `key`. The messages should carry `key`.
    pub fn exchange<F>(
        &mut self,
        key: Key<P>,
        outgoing: Vec<(PartyId, P::Message)>,
        continuation: F,
    ) -> Result<(), ProtocolError>
    where
        F: FnOnce(&mut P, &mut Context<'_, P>, Vec<Envelope<P::Message>>) -> Result<(), ProtocolError>
            + Send
            + 'static,
    {
        let partners: Vec<PartyId> = outgoing.iter().map(|(to, _)| *to).collect();
        self.on_receive_from(key, partners, continuation)?;
        for (to, message) in outgoing {
            self.send(to, message)?;
        }
        Ok(())
    }

    /// One lockstep round with every peer: broadcast `message` and collect
    /// every peer's message under `key`.
    pub fn broadcast_exchange<F>(
        &mut self,
        key: Key<P>,
        message: P::Message,
        continuation: F,
    ) -> Result<(), ProtocolError>
    where
        F: FnOnce(&mut P, &mut Context<'_, P>, Vec<Envelope<P::Message>>) -> Result<(), ProtocolError>
            + Send
            + 'static,
    {
        let peers = self.core.peers.clone();
        self.on_receive_from(key, peers, continuation)?;
        self.broadcast(message)
    }

    fn register(
        &mut self,
        key: Key<P>,
        expected: Expected,
        continuation: crate::Continuation<P>,
    ) -> Result<(), ProtocolError> {
        if self.core.waiters.contains_key(&key) {
            return Err(ProtocolError::DuplicateCollection {
                party: self.me(),
                key: format!("{key:?}"),
            });
        }
        for sender in self.core.mailbox.reject_unexpected(&key, &expected) {
            let diagnostic = Diagnostic::UnexpectedSender {
                party: self.me(),
                group: self.core.group,
                sender,
                key: format!("{key:?}"),
            };
            self.report(diagnostic);
        }
        let satisfied = self.core.mailbox.count(&key) >= expected.required();
        self.core.waiters.insert(
            key.clone(),
            Waiter {
                expected,
                continuation,
            },
        );
        if satisfied {
            self.core.mark_ready(key);
        }
        Ok(())
    }

    /// Set the session's output. A session completes at most once.
    pub fn complete(&mut self, output: P::Output) -> Result<(), ProtocolError> {
        if self.core.state == SessionState::Completed {
            return Err(ProtocolError::AlreadyCompleted {
                party: self.me(),
                group: self.core.group,
            });
        }
        self.core.output = Some(output);
        self.core.state = SessionState::Completed;
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.core.state == SessionState::Completed
    }

    /// Record a protocol anomaly for the run report.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!(party = %diagnostic.party(), "{diagnostic}");
        self.core.diagnostics.push(diagnostic);
    }

    /// Stop the simulation once the current dispatch finishes.
    pub fn halt(&self) {
        self.transport.halt();
    }

    /// Transport and RNG, for hosting nested sessions.
    pub(crate) fn split(&mut self) -> (&mut dyn Transport<P::Message>, &mut ChaCha8Rng) {
        (&mut *self.transport, &mut *self.rng)
    }
}
