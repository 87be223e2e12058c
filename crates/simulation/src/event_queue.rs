//! Event queue with deterministic ordering.

use crate::scheduler::{Handler, Scheduler};
use crate::simulation::Entity;
use crate::{EntityId, SimTime};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for the same instant)
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct EventKey {
    /// When this event should be processed.
    pub time: SimTime,
    /// Insertion order, unique per queue.
    pub sequence: u64,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A queued handler and the entity it runs against.
pub(crate) struct ScheduledEvent<E: Entity> {
    pub target: EntityId,
    pub handler: Handler<E>,
}

pub(crate) struct EventQueue<E: Entity> {
    events: BTreeMap<EventKey, ScheduledEvent<E>>,
    sequence: u64,
}

impl<E: Entity> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            sequence: 0,
        }
    }

    pub fn push(&mut self, time: SimTime, target: EntityId, handler: Handler<E>) -> EventKey {
        let key = EventKey {
            time,
            sequence: self.sequence,
        };
        self.sequence += 1;
        self.events.insert(key, ScheduledEvent { target, handler });
        key
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn first_time(&self) -> Option<SimTime> {
        self.events.first_key_value().map(|(k, _)| k.time)
    }

    /// Pop the earliest event unless it fires after `deadline`.
    pub fn pop_due(&mut self, deadline: Option<SimTime>) -> Option<(EventKey, ScheduledEvent<E>)> {
        let time = self.first_time()?;
        if deadline.is_some_and(|d| time > d) {
            return None;
        }
        self.events.pop_first()
    }

    /// Remove every event at the earliest timestamp, in insertion order.
    pub fn drain_earliest(
        &mut self,
        deadline: Option<SimTime>,
    ) -> Option<(SimTime, Vec<(EventKey, ScheduledEvent<E>)>)> {
        let time = self.first_time()?;
        if deadline.is_some_and(|d| time > d) {
            return None;
        }
        let mut batch = Vec::new();
        while let Some(entry) = self.events.first_entry() {
            if entry.key().time != time {
                break;
            }
            batch.push(entry.remove_entry());
        }
        Some((time, batch))
    }

    pub fn into_events(self) -> impl Iterator<Item = (EventKey, ScheduledEvent<E>)> {
        self.events.into_iter()
    }
}

impl<E: Entity> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
