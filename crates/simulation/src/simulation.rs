//! The simulation: entity table, scheduler and run statistics.

use crate::driver::Driver;
use crate::scheduler::{Delay, Scheduler};
use crate::{EntityId, SimTime, SimulationError};
use serde::Serialize;
use tracing::info;

/// Anything events are dispatched to.
///
/// Entities must be `Send` so the parallel driver can hand disjoint entities
/// to different workers.
pub trait Entity: Send + Sized + 'static {
    /// Error a handler may return; it aborts the run.
    type Error: std::error::Error + Send + Sync + 'static;
}

/// Statistics accumulated across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Handlers executed.
    pub events_processed: u64,
    /// Dispatch rounds: one per event sequentially, one per drained instant
    /// in parallel.
    pub batches: u64,
    /// Most distinct targets dispatched together.
    pub widest_batch: usize,
    /// Clock when the last run returned.
    pub final_time: SimTime,
    /// Whether the last run stopped because of `halt()`.
    pub halted: bool,
}

/// A discrete-event simulation over a fixed set of entities.
pub struct Simulation<E: Entity> {
    entities: Vec<E>,
    scheduler: Scheduler<E>,
    stats: SimulationStats,
}

impl<E: Entity> Simulation<E> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            scheduler: Scheduler::new(),
            stats: SimulationStats::default(),
        }
    }

    /// Register an entity. Identities are assigned densely from 0.
    pub fn add_entity(&mut self, entity: E) -> EntityId {
        let id = self.entities.len() as EntityId;
        self.entities.push(entity);
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&E> {
        self.entities.get(id as usize)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut E> {
        self.entities.get_mut(id as usize)
    }

    pub fn entities(&self) -> &[E] {
        &self.entities
    }

    pub fn into_entities(self) -> Vec<E> {
        self.entities
    }

    pub fn scheduler(&self) -> &Scheduler<E> {
        &self.scheduler
    }

    /// Schedule from outside any handler, relative to the current clock.
    pub fn schedule<F>(&self, target: EntityId, delay: Delay, handler: F)
    where
        F: FnOnce(&mut E, &Scheduler<E>) -> Result<(), E::Error> + Send + 'static,
    {
        self.scheduler.schedule(target, delay, handler);
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Run until the queue drains or a handler halts the simulation.
    pub fn run<D: Driver>(&mut self, driver: &D) -> Result<&SimulationStats, SimulationError> {
        self.run_bounded(driver, None)
    }

    /// Like [`Simulation::run`], leaving events later than `deadline` queued.
    pub fn run_until<D: Driver>(
        &mut self,
        driver: &D,
        deadline: SimTime,
    ) -> Result<&SimulationStats, SimulationError> {
        self.run_bounded(driver, Some(deadline))
    }

    fn run_bounded<D: Driver>(
        &mut self,
        driver: &D,
        deadline: Option<SimTime>,
    ) -> Result<&SimulationStats, SimulationError> {
        self.scheduler.resume();
        self.stats.halted = false;
        info!(
            driver = driver.name(),
            entities = self.entities.len(),
            pending = self.scheduler.pending(),
            ?deadline,
            "Starting simulation run"
        );

        driver.drive(&mut self.entities, &self.scheduler, deadline, &mut self.stats)?;

        self.stats.final_time = self.scheduler.now();
        self.stats.halted = self.scheduler.is_halted();
        info!(
            events = self.stats.events_processed,
            final_time = self.stats.final_time,
            remaining = self.scheduler.pending(),
            halted = self.stats.halted,
            "Simulation run finished"
        );
        Ok(&self.stats)
    }
}

impl<E: Entity> Default for Simulation<E> {
    fn default() -> Self {
        Self::new()
    }
}
