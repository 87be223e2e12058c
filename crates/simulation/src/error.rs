use crate::{EntityId, SimTime};
use thiserror::Error;

/// Errors that stop a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("delay must be non-negative, got {0}")]
    NegativeDelay(i64),

    #[error("event at t={time} targets unknown entity {target}")]
    UnknownTarget { target: EntityId, time: SimTime },

    #[error("handler for entity {target} failed at t={time}: {source}")]
    Handler {
        target: EntityId,
        time: SimTime,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to build rayon thread pool: {0}")]
    ThreadPool(String),
}

impl SimulationError {
    pub(crate) fn handler<E>(target: EntityId, time: SimTime, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler {
            target,
            time,
            source: Box::new(err),
        }
    }
}
