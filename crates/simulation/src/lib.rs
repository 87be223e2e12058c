//! Deterministic discrete-event simulation engine.
//!
//! Events are closures bound to a target entity and a fire time. Given the
//! same schedule, a run produces identical results every time, under either
//! driver.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Simulation<E>                        │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  Scheduler: Mutex<BTreeMap<EventKey, Event>>       │ │
//! │  │  Ordered by: time, insertion sequence              │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  Driver                                            │ │
//! │  │  sequential: one event at a time                   │ │
//! │  │  parallel:   one rayon task per target per instant │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  entities: Vec<E>                                  │ │
//! │  │  Handlers schedule new events                      │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mpcsim_simulation::{Delay, Entity, SequentialDriver, Simulation};
//! use std::convert::Infallible;
//!
//! struct Counter(u32);
//!
//! impl Entity for Counter {
//!     type Error = Infallible;
//! }
//!
//! let mut sim = Simulation::new();
//! let id = sim.add_entity(Counter(0));
//! sim.schedule(id, Delay::ticks(2), |c: &mut Counter, _| {
//!     c.0 += 1;
//!     Ok(())
//! });
//! let stats = sim.run(&SequentialDriver).unwrap();
//! assert_eq!(stats.final_time, 2);
//! assert_eq!(sim.entity(id).unwrap().0, 1);
//! ```

mod driver;
mod error;
mod event_queue;
mod scheduler;
mod simulation;

pub use driver::{AnyDriver, Driver, DriverKind, ParallelDriver, SequentialDriver};
pub use error::SimulationError;
pub use event_queue::EventKey;
pub use scheduler::{Delay, Handler, Scheduler};
pub use simulation::{Entity, Simulation, SimulationStats};

/// Dense index of an entity within a [`Simulation`].
pub type EntityId = u32;

/// Simulated time in ticks.
pub type SimTime = u64;
