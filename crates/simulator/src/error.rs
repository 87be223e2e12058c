use mpcsim_core::QuorumError;
use mpcsim_network::NetworkError;
use mpcsim_sharing::SharingError;
use thiserror::Error;

/// Errors preparing or running a scenario.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown scenario {0:?} (expected secret_sum, majority_filter, quorum_reshare or share_renewal)")]
    UnknownScenario(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Sharing(#[from] SharingError),

    #[error(transparent)]
    Quorum(#[from] QuorumError),
}
