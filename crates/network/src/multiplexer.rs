//! Several quorum sessions hosted by one party.

use crate::context::Context;
use crate::protocol::Protocol;
use crate::session::Session;
use crate::{Diagnostic, ProtocolError};
use mpcsim_core::{Envelope, GroupId, PartyId, Quorum};
use std::collections::BTreeMap;
use tracing::debug;

/// Runs one sub-session of `Q` per quorum the party belongs to and routes
/// each incoming envelope by its group id.
///
/// A sub-session's `broadcast` reaches the members of its own quorum. The
/// multiplexer completes with every sub-session's output once all
/// sub-sessions that produce output have completed.
pub struct Multiplexer<Q: Protocol> {
    sessions: BTreeMap<GroupId, Session<Q>>,
}

impl<Q: Protocol> Multiplexer<Q> {
    pub fn new(entries: impl IntoIterator<Item = (Quorum, Q)>) -> Self {
        let sessions = entries
            .into_iter()
            .map(|(quorum, protocol)| {
                let members = quorum.members().collect();
                (
                    quorum.id(),
                    Session::new(protocol, quorum.id(), members, Vec::new()),
                )
            })
            .collect();
        Self { sessions }
    }

    pub fn session(&self, group: GroupId) -> Option<&Session<Q>> {
        self.sessions.get(&group)
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.sessions.keys().copied()
    }

    fn all_done(&self) -> bool {
        self.sessions
            .values()
            .all(|s| s.is_completed() || !s.produces_output())
    }

    fn try_complete(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
        if ctx.is_completed() || !self.all_done() {
            return Ok(());
        }
        let outputs = self
            .sessions
            .iter()
            .filter_map(|(group, s)| s.output().map(|o| (*group, o.clone())))
            .collect();
        debug!(party = %ctx.me(), groups = self.sessions.len(), "All quorum sessions complete");
        ctx.complete(outputs)
    }
}

impl<Q: Protocol> Protocol for Multiplexer<Q> {
    type Message = Q::Message;
    type Output = BTreeMap<GroupId, Q::Output>;

    fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
        let quorums = ctx.quorums().to_vec();
        for session in self.sessions.values_mut() {
            if session.quorums().is_empty() {
                session.set_quorums(quorums.clone());
            }
            let (transport, rng) = ctx.split();
            session.start(transport, rng)?;
        }
        self.try_complete(ctx)
    }

    fn on_message(
        &mut self,
        ctx: &mut Context<'_, Self>,
        envelope: Envelope<Self::Message>,
    ) -> Result<(), ProtocolError> {
        let Some(session) = self.sessions.get_mut(&envelope.group) else {
            let diagnostic = Diagnostic::UnknownGroup {
                party: ctx.me(),
                group: envelope.group,
                sender: envelope.sender,
            };
            ctx.report(diagnostic);
            return Ok(());
        };
        let (transport, rng) = ctx.split();
        session.handle(envelope, transport, rng)?;
        self.try_complete(ctx)
    }

    fn produces_output(&self) -> bool {
        self.sessions.values().any(Session::produces_output)
    }

    fn collect_diagnostics(&self, me: PartyId, out: &mut Vec<Diagnostic>) {
        for session in self.sessions.values() {
            out.extend(session.diagnostics(me));
        }
    }
}
