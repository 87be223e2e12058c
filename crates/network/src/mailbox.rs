//! Stage-keyed message buffers.

use mpcsim_core::{Envelope, Message, PartyId};
use std::collections::{BTreeMap, BTreeSet};

/// What a collection waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expected {
    /// Any `n` distinct senders.
    Threshold(usize),
    /// Exactly these senders.
    Senders(BTreeSet<PartyId>),
}

impl Expected {
    pub fn required(&self) -> usize {
        match self {
            Expected::Threshold(n) => *n,
            Expected::Senders(set) => set.len(),
        }
    }

    pub fn admits(&self, sender: PartyId) -> bool {
        match self {
            Expected::Threshold(_) => true,
            Expected::Senders(set) => set.contains(&sender),
        }
    }
}

/// Outcome of buffering one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Buffered { count: usize },
    Duplicate,
    Unexpected,
}

/// Per-key buffers holding the current round of each collection in
/// arrival order. A sender contributes at most once per round.
pub(crate) struct Mailbox<M: Message> {
    rounds: BTreeMap<M::Key, Vec<Envelope<M>>>,
}

impl<M: Message> Mailbox<M> {
    pub fn new() -> Self {
        Self {
            rounds: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, envelope: Envelope<M>, expected: Option<&Expected>) -> Admission {
        if expected.is_some_and(|e| !e.admits(envelope.sender)) {
            return Admission::Unexpected;
        }
        let round = self.rounds.entry(envelope.key()).or_default();
        if round.iter().any(|e| e.sender == envelope.sender) {
            return Admission::Duplicate;
        }
        round.push(envelope);
        Admission::Buffered { count: round.len() }
    }

    pub fn count(&self, key: &M::Key) -> usize {
        self.rounds.get(key).map_or(0, Vec::len)
    }

    /// Drop buffered envelopes a newly registered collection does not
    /// expect, returning their senders.
    pub fn reject_unexpected(&mut self, key: &M::Key, expected: &Expected) -> Vec<PartyId> {
        let Some(round) = self.rounds.get_mut(key) else {
            return Vec::new();
        };
        let mut rejected = Vec::new();
        round.retain(|e| {
            let keep = expected.admits(e.sender);
            if !keep {
                rejected.push(e.sender);
            }
            keep
        });
        if round.is_empty() {
            self.rounds.remove(key);
        }
        rejected
    }

    /// Take the first `expected.required()` envelopes by arrival, sorted by
    /// sender. Later arrivals stay buffered as the start of the next round.
    pub fn take(&mut self, key: &M::Key, expected: &Expected) -> Vec<Envelope<M>> {
        let Some(mut round) = self.rounds.remove(key) else {
            return Vec::new();
        };
        let required = expected.required().min(round.len());
        let rest = round.split_off(required);
        if !rest.is_empty() {
            self.rounds.insert(key.clone(), rest);
        }
        round.sort_by_key(|e| e.sender);
        round
    }

    /// Keys with buffered envelopes and how many.
    pub fn buffered(&self) -> impl Iterator<Item = (&M::Key, usize)> {
        self.rounds.iter().map(|(k, v)| (k, v.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpcsim_core::GroupId;

    #[derive(Debug, Clone, PartialEq)]
    struct Vote(&'static str, u32);

    impl Message for Vote {
        type Key = &'static str;

        fn key(&self) -> &'static str {
            self.0
        }

        fn size(&self) -> usize {
            4
        }
    }

    fn env(sender: u32, key: &'static str, value: u32) -> Envelope<Vote> {
        Envelope {
            sender: PartyId(sender),
            recipient: PartyId(0),
            group: GroupId::ROOT,
            sent_at: 0,
            payload: Vote(key, value),
        }
    }

    #[test]
    fn test_first_message_per_sender_wins() {
        let mut mailbox = Mailbox::new();
        assert_eq!(
            mailbox.insert(env(1, "a", 10), None),
            Admission::Buffered { count: 1 }
        );
        assert_eq!(mailbox.insert(env(1, "a", 99), None), Admission::Duplicate);
        let taken = mailbox.take(&"a", &Expected::Threshold(1));
        assert_eq!(taken[0].payload.1, 10);
    }

    #[test]
    fn test_take_orders_by_sender_and_keeps_overflow() {
        let mut mailbox = Mailbox::new();
        for sender in [3, 1, 2] {
            mailbox.insert(env(sender, "a", sender), None);
        }
        let taken = mailbox.take(&"a", &Expected::Threshold(2));
        let senders: Vec<u32> = taken.iter().map(|e| e.sender.0).collect();
        assert_eq!(senders, vec![1, 3]);
        assert_eq!(mailbox.count(&"a"), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut mailbox = Mailbox::new();
        mailbox.insert(env(1, "a", 1), None);
        mailbox.insert(env(1, "b", 1), None);
        assert_eq!(mailbox.count(&"a"), 1);
        assert_eq!(mailbox.count(&"b"), 1);
        assert_eq!(mailbox.buffered().count(), 2);
    }

    #[test]
    fn test_expected_senders_filter() {
        let expected = Expected::Senders([PartyId(1), PartyId(2)].into_iter().collect());
        let mut mailbox = Mailbox::new();
        mailbox.insert(env(5, "a", 0), None);
        mailbox.insert(env(1, "a", 0), None);
        assert_eq!(mailbox.reject_unexpected(&"a", &expected), vec![PartyId(5)]);
        assert_eq!(
            mailbox.insert(env(7, "a", 0), Some(&expected)),
            Admission::Unexpected
        );
        assert_eq!(mailbox.count(&"a"), 1);
    }
}
