//! A protocol instance together with its collection state.

use crate::context::Context;
use crate::mailbox::{Expected, Mailbox};
use crate::protocol::{Continuation, Protocol, SessionState, Transport};
use crate::{Diagnostic, ProtocolError};
use mpcsim_core::{Envelope, GroupId, Message, PartyId, Quorum};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

type Key<P> = <<P as Protocol>::Message as Message>::Key;

pub(crate) struct Waiter<P: Protocol> {
    pub expected: Expected,
    pub continuation: Continuation<P>,
}

/// Everything a session owns besides the protocol itself.
///
/// Kept apart from the protocol so a continuation can borrow both at once.
pub(crate) struct SessionCore<P: Protocol> {
    pub group: GroupId,
    pub peers: Vec<PartyId>,
    pub quorums: Vec<Quorum>,
    pub state: SessionState,
    pub mailbox: Mailbox<P::Message>,
    pub waiters: BTreeMap<Key<P>, Waiter<P>>,
    /// Keys whose collection is satisfied, in the order they became so.
    pub ready: VecDeque<Key<P>>,
    pub output: Option<P::Output>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<P: Protocol> SessionCore<P> {
    fn new(group: GroupId, peers: Vec<PartyId>, quorums: Vec<Quorum>) -> Self {
        Self {
            group,
            peers,
            quorums,
            state: SessionState::Created,
            mailbox: Mailbox::new(),
            waiters: BTreeMap::new(),
            ready: VecDeque::new(),
            output: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn mark_ready(&mut self, key: Key<P>) {
        if !self.ready.contains(&key) {
            self.ready.push_back(key);
        }
    }
}

/// One protocol instance run by one party.
///
/// The network owns a session per party. Tests can drive one directly by
/// supplying their own [`Transport`].
pub struct Session<P: Protocol> {
    protocol: P,
    core: SessionCore<P>,
}

impl<P: Protocol> Session<P> {
    pub fn new(protocol: P, group: GroupId, peers: Vec<PartyId>, quorums: Vec<Quorum>) -> Self {
        Self {
            protocol,
            core: SessionCore::new(group, peers, quorums),
        }
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn group(&self) -> GroupId {
        self.core.group
    }

    pub fn peers(&self) -> &[PartyId] {
        &self.core.peers
    }

    pub fn state(&self) -> SessionState {
        self.core.state
    }

    pub fn is_completed(&self) -> bool {
        self.core.state == SessionState::Completed
    }

    pub fn output(&self) -> Option<&P::Output> {
        self.core.output.as_ref()
    }

    pub fn produces_output(&self) -> bool {
        self.protocol.produces_output()
    }

    pub(crate) fn set_peers(&mut self, peers: Vec<PartyId>) {
        self.core.peers = peers;
    }

    pub(crate) fn set_quorums(&mut self, quorums: Vec<Quorum>) {
        self.core.quorums = quorums;
    }

    pub(crate) fn quorums(&self) -> &[Quorum] {
        &self.core.quorums
    }

    /// Run [`Protocol::start`]. A session starts exactly once.
    pub fn start(
        &mut self,
        transport: &mut dyn Transport<P::Message>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), ProtocolError> {
        if self.core.state != SessionState::Created {
            return Err(ProtocolError::AlreadyStarted {
                party: transport.me(),
                group: self.core.group,
            });
        }
        self.core.state = SessionState::Running;
        let mut ctx = Context::new(&mut self.core, &mut *transport, &mut *rng);
        self.protocol.start(&mut ctx)?;
        self.pump(transport, rng)
    }

    /// Hand an incoming envelope to the protocol, then run every collection
    /// it satisfied.
    pub fn handle(
        &mut self,
        envelope: Envelope<P::Message>,
        transport: &mut dyn Transport<P::Message>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), ProtocolError> {
        let mut ctx = Context::new(&mut self.core, &mut *transport, &mut *rng);
        self.protocol.on_message(&mut ctx, envelope)?;
        self.pump(transport, rng)
    }

    fn pump(
        &mut self,
        transport: &mut dyn Transport<P::Message>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), ProtocolError> {
        while let Some(key) = self.core.ready.pop_front() {
            let Some(waiter) = self.core.waiters.remove(&key) else {
                continue;
            };
            let envelopes = self.core.mailbox.take(&key, &waiter.expected);
            debug!(
                party = %transport.me(),
                group = %self.core.group,
                key = ?key,
                count = envelopes.len(),
                "Collection complete"
            );
            let mut ctx = Context::new(&mut self.core, &mut *transport, &mut *rng);
            (waiter.continuation)(&mut self.protocol, &mut ctx, envelopes)?;
        }
        Ok(())
    }

    /// Anomalies recorded so far plus the ones visible in the final state:
    /// buffered messages nobody collected, collections still waiting, and a
    /// missing output.
    pub fn diagnostics(&self, me: PartyId) -> Vec<Diagnostic> {
        let group = self.core.group;
        let mut out = self.core.diagnostics.clone();
        for (key, count) in self.core.mailbox.buffered() {
            if !self.core.waiters.contains_key(key) {
                out.push(Diagnostic::Uncollected {
                    party: me,
                    group,
                    key: format!("{key:?}"),
                    count,
                });
            }
        }
        for (key, waiter) in &self.core.waiters {
            out.push(Diagnostic::PendingCollection {
                party: me,
                group,
                key: format!("{key:?}"),
                received: self.core.mailbox.count(key),
                required: waiter.expected.required(),
            });
        }
        if self.produces_output() && !self.is_completed() {
            out.push(Diagnostic::Incomplete { party: me, group });
        }
        self.protocol.collect_diagnostics(me, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrafficAnalyzer;
    use mpcsim_simulation::{Delay, SimTime};
    use rand::SeedableRng;

    #[derive(Debug, Clone, PartialEq)]
    struct Vote {
        round: u32,
        value: u64,
    }

    impl Message for Vote {
        type Key = u32;

        fn key(&self) -> u32 {
            self.round
        }

        fn size(&self) -> usize {
            12
        }
    }

    /// Records dispatched envelopes instead of scheduling them.
    struct Recorder {
        me: PartyId,
        sent: Vec<Envelope<Vote>>,
        traffic: TrafficAnalyzer,
    }

    impl Recorder {
        fn new(me: u32) -> Self {
            Self {
                me: PartyId(me),
                sent: Vec::new(),
                traffic: TrafficAnalyzer::new(),
            }
        }
    }

    impl Transport<Vote> for Recorder {
        fn me(&self) -> PartyId {
            self.me
        }

        fn now(&self) -> SimTime {
            0
        }

        fn round_length(&self) -> Option<u64> {
            None
        }

        fn dispatch(&mut self, envelope: Envelope<Vote>, _extra: Delay) -> Result<(), ProtocolError> {
            self.sent.push(envelope);
            Ok(())
        }

        fn traffic(&self) -> &TrafficAnalyzer {
            &self.traffic
        }

        fn charges_agreement(&self) -> bool {
            false
        }

        fn halt(&self) {}
    }

    /// Sums the values of every batch of `threshold` votes for round 0.
    struct Tally {
        threshold: usize,
        batches: Vec<Vec<PartyId>>,
    }

    impl Protocol for Tally {
        type Message = Vote;
        type Output = u64;

        fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
            let threshold = self.threshold;
            ctx.on_receive(0, threshold, Self::tally)
        }
    }

    impl Tally {
        fn tally(
            &mut self,
            ctx: &mut Context<'_, Self>,
            votes: Vec<Envelope<Vote>>,
        ) -> Result<(), ProtocolError> {
            self.batches.push(votes.iter().map(|v| v.sender).collect());
            if !ctx.is_completed() {
                ctx.complete(votes.iter().map(|v| v.payload.value).sum())?;
            }
            let threshold = self.threshold;
            ctx.on_receive(0, threshold, Self::tally)
        }
    }

    fn vote(sender: u32, value: u64) -> Envelope<Vote> {
        Envelope {
            sender: PartyId(sender),
            recipient: PartyId(0),
            group: GroupId::ROOT,
            sent_at: 0,
            payload: Vote { round: 0, value },
        }
    }

    fn tally_session(threshold: usize) -> Session<Tally> {
        let protocol = Tally {
            threshold,
            batches: Vec::new(),
        };
        Session::new(protocol, GroupId::ROOT, Vec::new(), Vec::new())
    }

    #[test]
    fn test_threshold_fires_once_then_starts_fresh_round() {
        let mut session = tally_session(5);
        let mut transport = Recorder::new(0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        session.start(&mut transport, &mut rng).unwrap();

        for sender in [4, 2, 3, 1] {
            session.handle(vote(sender, 1), &mut transport, &mut rng).unwrap();
        }
        assert!(session.protocol().batches.is_empty());

        session.handle(vote(5, 10), &mut transport, &mut rng).unwrap();
        assert_eq!(session.protocol().batches.len(), 1);
        assert_eq!(
            session.protocol().batches[0],
            (1..=5).map(PartyId).collect::<Vec<_>>()
        );
        assert_eq!(session.output(), Some(&14));

        session.handle(vote(6, 1), &mut transport, &mut rng).unwrap();
        assert_eq!(session.protocol().batches.len(), 1);
        let diagnostics = session.diagnostics(PartyId(0));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::PendingCollection {
                party: PartyId(0),
                group: GroupId::ROOT,
                key: "0".to_string(),
                received: 1,
                required: 5,
            }]
        );
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut session = tally_session(1);
        let mut transport = Recorder::new(3);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        session.start(&mut transport, &mut rng).unwrap();
        assert_eq!(
            session.start(&mut transport, &mut rng),
            Err(ProtocolError::AlreadyStarted {
                party: PartyId(3),
                group: GroupId::ROOT
            })
        );
    }

    #[test]
    fn test_messages_before_registration_are_buffered() {
        struct Late;

        impl Protocol for Late {
            type Message = Vote;
            type Output = usize;

            fn start(&mut self, _ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
                Ok(())
            }

            fn on_message(
                &mut self,
                ctx: &mut Context<'_, Self>,
                envelope: Envelope<Vote>,
            ) -> Result<(), ProtocolError> {
                let register = envelope.sender == PartyId(9);
                ctx.collect(envelope);
                if register {
                    ctx.on_receive(0, 3, |_: &mut Late, ctx, votes| ctx.complete(votes.len()))?;
                }
                Ok(())
            }
        }

        let mut session = Session::new(Late, GroupId::ROOT, Vec::new(), Vec::new());
        let mut transport = Recorder::new(0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        session.start(&mut transport, &mut rng).unwrap();
        session.handle(vote(1, 0), &mut transport, &mut rng).unwrap();
        session.handle(vote(2, 0), &mut transport, &mut rng).unwrap();
        assert_eq!(
            session.diagnostics(PartyId(0))[0],
            Diagnostic::Uncollected {
                party: PartyId(0),
                group: GroupId::ROOT,
                key: "0".to_string(),
                count: 2,
            }
        );
        session.handle(vote(9, 0), &mut transport, &mut rng).unwrap();
        assert_eq!(session.output(), Some(&3));
        assert!(session.diagnostics(PartyId(0)).is_empty());
    }

    #[test]
    fn test_broadcast_goes_through_transport() {
        struct Shout;

        impl Protocol for Shout {
            type Message = Vote;
            type Output = ();

            fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
                ctx.broadcast(Vote { round: 1, value: 7 })?;
                ctx.complete(())
            }
        }

        let peers: Vec<PartyId> = (0..4).map(PartyId).collect();
        let mut session = Session::new(Shout, GroupId::ROOT, peers, Vec::new());
        let mut transport = Recorder::new(2);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        session.start(&mut transport, &mut rng).unwrap();

        let recipients: Vec<u32> = transport.sent.iter().map(|e| e.recipient.0).collect();
        assert_eq!(recipients, vec![0, 1, 2, 3]);
        assert!(transport.sent.iter().all(|e| e.sender == PartyId(2)));
        assert_eq!(transport.traffic.totals(), (4, 48));
    }
}
