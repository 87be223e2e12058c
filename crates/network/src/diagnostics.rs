//! Protocol anomalies recorded during a run.

use mpcsim_core::{GroupId, PartyId};
use serde::Serialize;
use std::fmt;

/// Something a protocol did that is legal for the engine but likely a bug or
/// a misbehaving peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Diagnostic {
    /// A second message for the same key from the same sender arrived before
    /// the collection fired. The first one is kept.
    DuplicateMessage {
        party: PartyId,
        group: GroupId,
        sender: PartyId,
        key: String,
    },
    /// A message arrived for a collection that does not expect its sender.
    UnexpectedSender {
        party: PartyId,
        group: GroupId,
        sender: PartyId,
        key: String,
    },
    /// An envelope addressed a group the party does not host.
    UnknownGroup {
        party: PartyId,
        group: GroupId,
        sender: PartyId,
    },
    /// Messages were buffered but no collection ever consumed them.
    Uncollected {
        party: PartyId,
        group: GroupId,
        key: String,
        count: usize,
    },
    /// A collection was still waiting when the run ended.
    PendingCollection {
        party: PartyId,
        group: GroupId,
        key: String,
        received: usize,
        required: usize,
    },
    /// The session never produced its output.
    Incomplete { party: PartyId, group: GroupId },
}

impl Diagnostic {
    pub fn party(&self) -> PartyId {
        match self {
            Diagnostic::DuplicateMessage { party, .. }
            | Diagnostic::UnexpectedSender { party, .. }
            | Diagnostic::UnknownGroup { party, .. }
            | Diagnostic::Uncollected { party, .. }
            | Diagnostic::PendingCollection { party, .. }
            | Diagnostic::Incomplete { party, .. } => *party,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateMessage {
                party,
                group,
                sender,
                key,
            } => write!(f, "{party}@{group}: duplicate message from {sender} for {key}"),
            Diagnostic::UnexpectedSender {
                party,
                group,
                sender,
                key,
            } => write!(f, "{party}@{group}: unexpected sender {sender} for {key}"),
            Diagnostic::UnknownGroup {
                party,
                group,
                sender,
            } => write!(f, "{party}: message from {sender} for unknown group {group}"),
            Diagnostic::Uncollected {
                party,
                group,
                key,
                count,
            } => write!(f, "{party}@{group}: {count} message(s) for {key} never collected"),
            Diagnostic::PendingCollection {
                party,
                group,
                key,
                received,
                required,
            } => write!(
                f,
                "{party}@{group}: collection {key} still waiting ({received}/{required})"
            ),
            Diagnostic::Incomplete { party, group } => {
                write!(f, "{party}@{group}: session never completed")
            }
        }
    }
}
