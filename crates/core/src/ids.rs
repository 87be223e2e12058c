//! Party and group identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identity of a simulated party.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PartyId(pub u32);

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl From<u32> for PartyId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Protocol instance a message belongs to when one party runs several.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl GroupId {
    /// The group of a party's top-level session.
    pub const ROOT: GroupId = GroupId(0);
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// A party addressed inside a specific group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VirtualId {
    pub group: GroupId,
    pub party: PartyId,
}

impl VirtualId {
    pub fn new(group: GroupId, party: PartyId) -> Self {
        Self { group, party }
    }
}

impl fmt::Display for VirtualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_virtual_ids_distinct_across_groups() {
        let a = VirtualId::new(GroupId(1), PartyId(3));
        let b = VirtualId::new(GroupId(3), PartyId(1));
        let set: HashSet<_> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(a.to_string(), "G1/P3");
    }

    #[test]
    fn test_ordering_is_group_major() {
        let mut ids = vec![
            VirtualId::new(GroupId(2), PartyId(0)),
            VirtualId::new(GroupId(1), PartyId(5)),
            VirtualId::new(GroupId(1), PartyId(2)),
        ];
        ids.sort();
        assert_eq!(ids[0], VirtualId::new(GroupId(1), PartyId(2)));
        assert_eq!(ids[2].group, GroupId(2));
    }
}
