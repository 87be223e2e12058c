//! The protocol abstraction and the transport it sends through.

use crate::context::Context;
use crate::{Diagnostic, ProtocolError, TrafficAnalyzer};
use mpcsim_core::{Envelope, Message, PartyId};
use mpcsim_simulation::{Delay, SimTime};
use std::fmt::Debug;

/// Stateful logic one party runs for one distributed algorithm.
///
/// The engine calls [`Protocol::start`] exactly once, then
/// [`Protocol::on_message`] for every message addressed to the session. The
/// default `on_message` buffers the message for stage-keyed collection, so
/// most protocols only implement `start` and chain
/// [`Context::on_receive`] continuations from there.
pub trait Protocol: Send + Sized + 'static {
    type Message: Message;
    type Output: Clone + Debug + Send + 'static;

    fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError>;

    fn on_message(
        &mut self,
        ctx: &mut Context<'_, Self>,
        envelope: Envelope<Self::Message>,
    ) -> Result<(), ProtocolError> {
        ctx.collect(envelope);
        Ok(())
    }

    /// Whether a run that ends without output is worth reporting. Pure
    /// relays return `false`.
    fn produces_output(&self) -> bool {
        true
    }

    /// Anomalies from state the session does not see, such as nested
    /// sessions.
    fn collect_diagnostics(&self, _me: PartyId, _out: &mut Vec<Diagnostic>) {}
}

/// Callback run once a collection is satisfied, with the collected
/// envelopes ordered by sender.
pub type Continuation<P> = Box<
    dyn FnOnce(
            &mut P,
            &mut Context<'_, P>,
            Vec<Envelope<<P as Protocol>::Message>>,
        ) -> Result<(), ProtocolError>
        + Send,
>;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Created,
    Running,
    Completed,
}

/// Where a session's outgoing messages go.
///
/// The network implements this for every party. A test can implement it to
/// drive a [`crate::Session`] without a scheduler.
pub trait Transport<M: Message> {
    /// Party the transport sends for.
    fn me(&self) -> PartyId;

    fn now(&self) -> SimTime;

    /// Round length under the synchronous model.
    fn round_length(&self) -> Option<u64>;

    /// Schedule delivery of `envelope`, `extra` beyond the model's delay.
    fn dispatch(&mut self, envelope: Envelope<M>, extra: Delay) -> Result<(), ProtocolError>;

    fn traffic(&self) -> &TrafficAnalyzer;

    /// Whether reliable broadcasts are charged agreement overhead.
    fn charges_agreement(&self) -> bool;

    /// Stop the whole simulation after the current dispatch.
    fn halt(&self);
}
