//! Drivers: how queued events are dispatched to entities.
//!
//! - [`SequentialDriver`] pops one event at a time. The global order is the
//!   queue order `(time, insertion)`.
//! - [`ParallelDriver`] drains every event at the earliest instant, groups
//!   them by target, and runs distinct targets concurrently on a rayon pool.
//!   Events of one target run in enqueue order on one worker. Each handler
//!   schedules into a private outbox; outboxes are merged back in the order
//!   the sequential driver would have run the handlers, so both drivers build
//!   the same queue and a conflict-free protocol reaches the same results.

use crate::event_queue::EventKey;
use crate::scheduler::{Handler, Scheduler};
use crate::simulation::{Entity, SimulationStats};
use crate::{EntityId, SimTime, SimulationError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Dispatch strategy for a [`crate::Simulation`].
pub trait Driver {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Dispatch events until the queue drains, the next event lies beyond
    /// `deadline`, or the scheduler is halted.
    fn drive<E: Entity>(
        &self,
        entities: &mut [E],
        scheduler: &Scheduler<E>,
        deadline: Option<SimTime>,
        stats: &mut SimulationStats,
    ) -> Result<(), SimulationError>;
}

/// One event at a time, in queue order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialDriver;

impl Driver for SequentialDriver {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn drive<E: Entity>(
        &self,
        entities: &mut [E],
        scheduler: &Scheduler<E>,
        deadline: Option<SimTime>,
        stats: &mut SimulationStats,
    ) -> Result<(), SimulationError> {
        while !scheduler.is_halted() {
            let Some((key, event)) = scheduler.pop_due(deadline) else {
                break;
            };
            scheduler.advance_to(key.time);

            let entity = entities
                .get_mut(event.target as usize)
                .ok_or(SimulationError::UnknownTarget {
                    target: event.target,
                    time: key.time,
                })?;

            trace!(
                time = key.time,
                target = event.target,
                sequence = key.sequence,
                "Dispatching event"
            );
            (event.handler)(entity, scheduler)
                .map_err(|e| SimulationError::handler(event.target, key.time, e))?;

            stats.events_processed += 1;
            stats.batches += 1;
            stats.widest_batch = stats.widest_batch.max(1);
        }
        Ok(())
    }
}

/// One target's handlers for an instant, with exclusive access to it.
type TargetGroup<'a, E> = (EntityId, &'a mut E, Vec<(EventKey, Handler<E>)>);

/// Per-handler outboxes tagged with the handler's queue sequence.
type Outboxes<E> = Vec<(u64, Scheduler<E>)>;

/// Concurrent dispatch of same-instant events to distinct targets.
///
/// Uses the global rayon pool unless built with
/// [`ParallelDriver::with_threads`].
#[derive(Debug, Default)]
pub struct ParallelDriver {
    pool: Option<rayon::ThreadPool>,
}

impl ParallelDriver {
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Run on a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, SimulationError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mpcsim-driver-{i}"))
            .build()
            .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    fn run_groups<E: Entity>(
        &self,
        work: Vec<TargetGroup<'_, E>>,
        time: SimTime,
    ) -> Vec<Result<Outboxes<E>, SimulationError>> {
        let dispatch = |(target, entity, handlers): TargetGroup<'_, E>| -> Result<Outboxes<E>, SimulationError> {
            let mut outboxes = Vec::with_capacity(handlers.len());
            for (key, handler) in handlers {
                let outbox = Scheduler::starting_at(time);
                trace!(time, target, sequence = key.sequence, "Dispatching event");
                handler(entity, &outbox).map_err(|e| SimulationError::handler(target, time, e))?;
                outboxes.push((key.sequence, outbox));
            }
            Ok(outboxes)
        };
        match &self.pool {
            Some(pool) => pool.install(|| work.into_par_iter().map(dispatch).collect()),
            None => work.into_par_iter().map(dispatch).collect(),
        }
    }
}

impl Driver for ParallelDriver {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn drive<E: Entity>(
        &self,
        entities: &mut [E],
        scheduler: &Scheduler<E>,
        deadline: Option<SimTime>,
        stats: &mut SimulationStats,
    ) -> Result<(), SimulationError> {
        while !scheduler.is_halted() {
            let Some((time, batch)) = scheduler.drain_earliest(deadline) else {
                break;
            };
            scheduler.advance_to(time);

            let events = batch.len();
            let mut groups: BTreeMap<EntityId, Vec<(EventKey, Handler<E>)>> = BTreeMap::new();
            for (key, event) in batch {
                groups
                    .entry(event.target)
                    .or_default()
                    .push((key, event.handler));
            }
            if let Some(&target) = groups.keys().next_back() {
                if target as usize >= entities.len() {
                    return Err(SimulationError::UnknownTarget { target, time });
                }
            }
            let width = groups.len();

            let work: Vec<_> = entities
                .iter_mut()
                .enumerate()
                .filter_map(|(i, entity)| {
                    let target = i as EntityId;
                    groups
                        .remove(&target)
                        .map(|handlers| (target, entity, handlers))
                })
                .collect();

            // Results come back in target order; the first error wins.
            let mut outboxes = Vec::with_capacity(events);
            for result in self.run_groups(work, time) {
                outboxes.extend(result?);
            }
            outboxes.sort_unstable_by_key(|(sequence, _)| *sequence);
            for (_, outbox) in outboxes {
                scheduler.absorb(outbox);
            }

            stats.events_processed += events as u64;
            stats.batches += 1;
            stats.widest_batch = stats.widest_batch.max(width);
            debug!(time, targets = width, events, "Dispatched batch");
        }
        Ok(())
    }
}

/// Driver selection, as it appears in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriverKind {
    #[default]
    Sequential,
    Parallel {
        /// Dedicated pool size; the global rayon pool when absent.
        #[serde(default)]
        threads: Option<usize>,
    },
}

impl DriverKind {
    pub fn build(self) -> Result<AnyDriver, SimulationError> {
        Ok(match self {
            DriverKind::Sequential => AnyDriver::Sequential(SequentialDriver),
            DriverKind::Parallel { threads: None } => AnyDriver::Parallel(ParallelDriver::new()),
            DriverKind::Parallel {
                threads: Some(threads),
            } => AnyDriver::Parallel(ParallelDriver::with_threads(threads)?),
        })
    }
}

/// A driver chosen at runtime.
#[derive(Debug)]
pub enum AnyDriver {
    Sequential(SequentialDriver),
    Parallel(ParallelDriver),
}

impl Driver for AnyDriver {
    fn name(&self) -> &'static str {
        match self {
            AnyDriver::Sequential(d) => d.name(),
            AnyDriver::Parallel(d) => d.name(),
        }
    }

    fn drive<E: Entity>(
        &self,
        entities: &mut [E],
        scheduler: &Scheduler<E>,
        deadline: Option<SimTime>,
        stats: &mut SimulationStats,
    ) -> Result<(), SimulationError> {
        match self {
            AnyDriver::Sequential(d) => d.drive(entities, scheduler, deadline, stats),
            AnyDriver::Parallel(d) => d.drive(entities, scheduler, deadline, stats),
        }
    }
}
