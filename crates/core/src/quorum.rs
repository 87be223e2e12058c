//! Quorums: ordered member sets with fault thresholds.

use crate::{GroupId, PartyId};
use rand::seq::index::sample;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuorumError {
    #[error("quorum size {size} exceeds the {parties} available parties")]
    TooLarge { size: usize, parties: usize },

    #[error("{count} quorums of size {size} cannot cover {parties} parties")]
    CannotCover {
        count: usize,
        size: usize,
        parties: usize,
    },
}

/// A named, ordered set of parties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quorum {
    id: GroupId,
    members: BTreeSet<PartyId>,
}

impl Quorum {
    pub fn new(id: GroupId, members: impl IntoIterator<Item = PartyId>) -> Self {
        Self {
            id,
            members: members.into_iter().collect(),
        }
    }

    /// Parties `start..end`.
    pub fn contiguous(id: GroupId, start: u32, end: u32) -> Self {
        Self::new(id, (start..end).map(PartyId))
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn members(&self) -> impl ExactSizeIterator<Item = PartyId> + '_ {
        self.members.iter().copied()
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, party: PartyId) -> bool {
        self.members.contains(&party)
    }

    /// Corrupt members tolerated: `⌈size / 3⌉`.
    pub fn byzantine_threshold(&self) -> usize {
        self.size().div_ceil(3)
    }

    /// Simple majority bound: `size / 2`.
    pub fn majority_threshold(&self) -> usize {
        self.size() / 2
    }

    /// 1-based rank of `party` among the members, used as its evaluation
    /// point in sharings local to this quorum.
    pub fn position_of(&self, party: PartyId) -> Option<usize> {
        self.members
            .iter()
            .position(|&m| m == party)
            .map(|i| i + 1)
    }

    /// Member at a 1-based position.
    pub fn member_at(&self, position: usize) -> Option<PartyId> {
        position
            .checked_sub(1)
            .and_then(|i| self.members.iter().nth(i).copied())
    }
}

/// Sample `count` quorums of `size` distinct parties each, so that every party
/// belongs to at least one quorum.
///
/// Quorum `i` gets `GroupId(i + 1)`. The parties are shuffled and dealt
/// round-robin across the quorums, then each quorum is topped up with a
/// random sample of non-members. The result depends only on the RNG state.
pub fn generate_quorums<R: Rng + ?Sized>(
    parties: &[PartyId],
    count: usize,
    size: usize,
    rng: &mut R,
) -> Result<Vec<Quorum>, QuorumError> {
    let mut ordered: Vec<PartyId> = parties
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if size > ordered.len() {
        return Err(QuorumError::TooLarge {
            size,
            parties: ordered.len(),
        });
    }
    // An overflowing product covers any party set.
    if count.saturating_mul(size) < ordered.len() {
        return Err(QuorumError::CannotCover {
            count,
            size,
            parties: ordered.len(),
        });
    }

    let mut members: Vec<BTreeSet<PartyId>> = vec![BTreeSet::new(); count];
    let universe = ordered.clone();
    ordered.shuffle(rng);
    for (i, party) in ordered.into_iter().enumerate() {
        members[i % count].insert(party);
    }

    let quorums = members
        .into_iter()
        .enumerate()
        .map(|(i, mut picked)| {
            let rest: Vec<PartyId> = universe
                .iter()
                .copied()
                .filter(|p| !picked.contains(p))
                .collect();
            let missing = size - picked.len();
            picked.extend(sample(rng, rest.len(), missing).into_iter().map(|j| rest[j]));
            Quorum::new(GroupId(i as u32 + 1), picked)
        })
        .collect();
    Ok(quorums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn parties(n: u32) -> Vec<PartyId> {
        (0..n).map(PartyId).collect()
    }

    #[test]
    fn test_thresholds() {
        let q = Quorum::contiguous(GroupId(1), 0, 7);
        assert_eq!(q.size(), 7);
        assert_eq!(q.byzantine_threshold(), 3);
        assert_eq!(q.majority_threshold(), 3);

        let q = Quorum::contiguous(GroupId(1), 0, 6);
        assert_eq!(q.byzantine_threshold(), 2);
        assert_eq!(q.majority_threshold(), 3);
    }

    #[test]
    fn test_position_is_one_based_rank() {
        let q = Quorum::new(GroupId(2), [PartyId(9), PartyId(4), PartyId(6)]);
        assert_eq!(q.position_of(PartyId(4)), Some(1));
        assert_eq!(q.position_of(PartyId(9)), Some(3));
        assert_eq!(q.position_of(PartyId(5)), None);
        assert_eq!(q.member_at(2), Some(PartyId(6)));
        assert_eq!(q.member_at(0), None);
    }

    #[test]
    fn test_generated_quorums_cover_everyone() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let all = parties(12);
        let quorums = generate_quorums(&all, 4, 4, &mut rng).unwrap();
        assert_eq!(quorums.len(), 4);
        for (i, q) in quorums.iter().enumerate() {
            assert_eq!(q.id(), GroupId(i as u32 + 1));
            assert_eq!(q.size(), 4);
        }
        for p in &all {
            assert!(quorums.iter().any(|q| q.contains(*p)), "{p} uncovered");
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let all = parties(10);
        let a = generate_quorums(&all, 3, 5, &mut ChaCha8Rng::seed_from_u64(8)).unwrap();
        let b = generate_quorums(&all, 3, 5, &mut ChaCha8Rng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_exact_cover_is_a_partition() {
        let mut rng = ChaCha8Rng::seed_from_u64(30);
        let all = parties(30);
        let quorums = generate_quorums(&all, 10, 3, &mut rng).unwrap();
        assert_eq!(quorums.len(), 10);
        assert!(quorums.iter().all(|q| q.size() == 3));
        let covered: BTreeSet<PartyId> = quorums.iter().flat_map(|q| q.members()).collect();
        assert_eq!(covered.len(), 30);
    }

    #[test]
    fn test_near_exact_cover_tops_up() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let all = parties(29);
        let quorums = generate_quorums(&all, 6, 5, &mut rng).unwrap();
        assert!(quorums.iter().all(|q| q.size() == 5));
        for p in &all {
            assert!(quorums.iter().any(|q| q.contains(*p)), "{p} uncovered");
        }
    }

    #[test]
    fn test_impossible_cover_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            generate_quorums(&parties(10), 2, 4, &mut rng),
            Err(QuorumError::CannotCover {
                count: 2,
                size: 4,
                parties: 10
            })
        );
        assert_eq!(
            generate_quorums(&parties(3), 2, 4, &mut rng),
            Err(QuorumError::TooLarge {
                size: 4,
                parties: 3
            })
        );
    }
}
