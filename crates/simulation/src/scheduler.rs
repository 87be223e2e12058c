//! Event scheduling shared by handlers and drivers.

use crate::event_queue::{EventKey, EventQueue, ScheduledEvent};
use crate::simulation::Entity;
use crate::{EntityId, SimTime, SimulationError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A closure run against its target entity when its event fires.
pub type Handler<E> =
    Box<dyn FnOnce(&mut E, &Scheduler<E>) -> Result<(), <E as Entity>::Error> + Send>;

/// Non-negative distance in simulated ticks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Delay(u64);

impl Delay {
    pub const ZERO: Delay = Delay(0);

    pub const fn ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn as_ticks(self) -> u64 {
        self.0
    }
}

impl From<u64> for Delay {
    fn from(ticks: u64) -> Self {
        Self(ticks)
    }
}

impl TryFrom<i64> for Delay {
    type Error = SimulationError;

    fn try_from(ticks: i64) -> Result<Self, Self::Error> {
        u64::try_from(ticks)
            .map(Delay)
            .map_err(|_| SimulationError::NegativeDelay(ticks))
    }
}

impl std::ops::Add for Delay {
    type Output = Delay;

    fn add(self, rhs: Delay) -> Delay {
        Delay(self.0.saturating_add(rhs.0))
    }
}

/// Event queue, simulated clock and halt flag.
///
/// `schedule` takes `&self`: the queue sits behind a short mutex critical
/// section so handlers running on rayon workers can enqueue concurrently.
pub struct Scheduler<E: Entity> {
    queue: Mutex<EventQueue<E>>,
    now: AtomicU64,
    halted: AtomicBool,
}

impl<E: Entity> Scheduler<E> {
    pub(crate) fn new() -> Self {
        Self::starting_at(0)
    }

    /// An empty scheduler whose clock reads `now`.
    ///
    /// The parallel driver gives each handler one of these as an outbox and
    /// merges it back in dispatch order.
    pub(crate) fn starting_at(now: SimTime) -> Self {
        Self {
            queue: Mutex::new(EventQueue::new()),
            now: AtomicU64::new(now),
            halted: AtomicBool::new(false),
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now.load(Ordering::Acquire)
    }

    /// Enqueue `handler` to run against `target` at `now + delay`.
    ///
    /// Events for the same instant run in insertion order, so a zero delay
    /// resolves after everything already queued for the current instant.
    pub fn schedule<F>(&self, target: EntityId, delay: Delay, handler: F) -> EventKey
    where
        F: FnOnce(&mut E, &Scheduler<E>) -> Result<(), E::Error> + Send + 'static,
    {
        let time = self.now().saturating_add(delay.as_ticks());
        self.queue.lock().push(time, target, Box::new(handler))
    }

    /// Stop the run before the queue drains. Queued events are kept.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::Release);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Events still queued.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Time of the earliest queued event.
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.queue.lock().first_time()
    }

    pub(crate) fn resume(&self) {
        self.halted.store(false, Ordering::Release);
    }

    pub(crate) fn advance_to(&self, time: SimTime) {
        self.now.store(time, Ordering::Release);
    }

    pub(crate) fn pop_due(&self, deadline: Option<SimTime>) -> Option<(EventKey, ScheduledEvent<E>)> {
        self.queue.lock().pop_due(deadline)
    }

    pub(crate) fn drain_earliest(
        &self,
        deadline: Option<SimTime>,
    ) -> Option<(SimTime, Vec<(EventKey, ScheduledEvent<E>)>)> {
        self.queue.lock().drain_earliest(deadline)
    }

    /// Move an outbox's events into this queue, keeping their relative
    /// order, and carry over a halt request.
    pub(crate) fn absorb(&self, outbox: Scheduler<E>) {
        if outbox.is_halted() {
            self.halt();
        }
        let events = outbox.queue.into_inner().into_events();
        let mut queue = self.queue.lock();
        for (key, event) in events {
            queue.push(key.time, event.target, event.handler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    struct Noop;

    impl Entity for Noop {
        type Error = Infallible;
    }

    #[test]
    fn test_negative_delay_rejected() {
        assert!(matches!(
            Delay::try_from(-1i64),
            Err(SimulationError::NegativeDelay(-1))
        ));
        assert_eq!(Delay::try_from(4i64).unwrap(), Delay::ticks(4));
    }

    #[test]
    fn test_schedule_is_relative_to_now() {
        let scheduler = Scheduler::<Noop>::starting_at(10);
        let key = scheduler.schedule(0, Delay::ticks(3), |_, _| Ok(()));
        assert_eq!(key.time, 13);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_event_time(), Some(13));
    }

    #[test]
    fn test_absorb_preserves_order_and_halt() {
        let parent = Scheduler::<Noop>::new();
        parent.schedule(0, Delay::ticks(1), |_, _| Ok(()));

        let outbox = Scheduler::<Noop>::starting_at(0);
        outbox.schedule(2, Delay::ticks(1), |_, _| Ok(()));
        outbox.schedule(1, Delay::ticks(1), |_, _| Ok(()));
        outbox.halt();
        parent.absorb(outbox);

        assert!(parent.is_halted());
        let (_, batch) = parent.drain_earliest(None).unwrap();
        let targets: Vec<EntityId> = batch.iter().map(|(_, e)| e.target).collect();
        assert_eq!(targets, vec![0, 2, 1]);
    }
}
