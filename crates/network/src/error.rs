use mpcsim_core::{GroupId, PartyId, QuorumError};
use mpcsim_field::FieldError;
use mpcsim_sharing::SharingError;
use mpcsim_simulation::SimulationError;
use thiserror::Error;

/// Errors raised by a protocol session. Returned from a handler, they abort
/// the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("{party} already started the session of {group}")]
    AlreadyStarted { party: PartyId, group: GroupId },

    #[error("{party} already completed the session of {group}")]
    AlreadyCompleted { party: PartyId, group: GroupId },

    #[error("{party} registered a second collection for key {key}")]
    DuplicateCollection { party: PartyId, key: String },

    #[error("no party {0} in the network")]
    UnknownParty(PartyId),

    #[error("quorum index {index} out of range ({available} quorums)")]
    UnknownQuorum { index: usize, available: usize },

    #[error("{what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("protocol failure: {0}")]
    Failed(String),

    #[error(transparent)]
    Sharing(#[from] SharingError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Quorum(#[from] QuorumError),
}

/// Errors building or running a [`crate::Network`].
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("party {0} is already registered")]
    DuplicateParty(PartyId),

    #[error("cannot add party {0} after the network has started")]
    AlreadyStarted(PartyId),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}
