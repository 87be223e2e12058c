//! Messages and envelopes.

use crate::{GroupId, PartyId, VirtualId};
use std::fmt::Debug;
use std::hash::Hash;

/// Key demultiplexing concurrent collection rounds.
///
/// Blanket-implemented; any small value type with total order works, e.g.
/// `(Stage, u32)` or a dedicated enum.
pub trait StateKey: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

impl<T> StateKey for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

/// A protocol message.
///
/// Messages are values: a broadcast clones the payload once per recipient and
/// nothing mutates it after sending.
pub trait Message: Clone + Debug + Send + Sync + 'static {
    type Key: StateKey;

    /// Collection round this message belongs to.
    fn key(&self) -> Self::Key;

    /// Size in bytes charged to bandwidth accounting.
    fn size(&self) -> usize;

    /// Label for per-kind traffic breakdowns.
    fn kind(&self) -> &'static str {
        let name = std::any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name)
    }
}

/// A message in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<M> {
    pub sender: PartyId,
    pub recipient: PartyId,
    /// Sub-session the message is addressed to on the recipient.
    pub group: GroupId,
    /// Simulated time the message was sent.
    pub sent_at: u64,
    pub payload: M,
}

impl<M: Message> Envelope<M> {
    pub fn key(&self) -> M::Key {
        self.payload.key()
    }

    pub fn size(&self) -> usize {
        self.payload.size()
    }

    pub fn from_virtual(&self) -> VirtualId {
        VirtualId::new(self.group, self.sender)
    }
}

impl<M> Envelope<M> {
    pub fn into_payload(self) -> M {
        self.payload
    }
}
