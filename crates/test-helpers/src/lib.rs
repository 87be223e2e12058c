//! Test helpers for the MPC simulator: deterministic dealings and corrupted
//! share fixtures.
//!
//! # Example
//!
//! ```rust
//! use mpcsim_test_helpers::TestDealing;
//! use mpcsim_sharing::recombine;
//!
//! // Deal secret 26 among 4 parties with degree 1 over Z_29
//! let dealing = TestDealing::new(29, 26, 4, 1, 42);
//! let secret = recombine(&dealing.shares()[2..], 1, 29).unwrap();
//! assert_eq!(secret.value(), 26);
//! ```

pub mod byzantine;
pub mod fixtures;

use mpcsim_field::Zp;
use mpcsim_sharing::{share, Share};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Primes used across tests: tiny (collisions likely), mid-size, and the
/// largest prime below `2^64`.
pub const TEST_PRIMES: [u64; 5] = [29, 101, 7919, 2_147_483_647, 18_446_744_073_709_551_557];

/// Seeded RNG for reproducible tests.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Per-party seed derivation shared with the simulated network.
pub fn party_seed(seed: u64, index: u64) -> u64 {
    seed.wrapping_add(index).wrapping_mul(0x517cc1b727220a95)
}

/// A secret dealt to a fixed committee with a deterministic RNG.
pub struct TestDealing {
    prime: u64,
    secret: Zp,
    degree: usize,
    shares: Vec<Share>,
}

impl std::fmt::Debug for TestDealing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDealing")
            .field("prime", &self.prime)
            .field("parties", &self.shares.len())
            .field("degree", &self.degree)
            .finish()
    }
}

impl TestDealing {
    /// Deal `secret` among `parties` with a polynomial of degree `degree`.
    ///
    /// # Panics
    ///
    /// Panics if `parties <= degree`.
    pub fn new(prime: u64, secret: u64, parties: usize, degree: usize, seed: u64) -> Self {
        let secret = Zp::new(prime, secret);
        let mut rng = seeded_rng(seed);
        let shares = share(secret, parties, degree, &mut rng).expect("valid dealing parameters");
        Self {
            prime,
            secret,
            degree,
            shares,
        }
    }

    pub fn prime(&self) -> u64 {
        self.prime
    }

    pub fn secret(&self) -> Zp {
        self.secret
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn size(&self) -> usize {
        self.shares.len()
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    /// Share of party `idx` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()`.
    pub fn share(&self, idx: usize) -> &Share {
        &self.shares[idx]
    }

    pub fn xs(&self) -> Vec<Zp> {
        self.shares.iter().map(|s| s.point).collect()
    }

    pub fn ys(&self) -> Vec<Zp> {
        self.shares.iter().map(|s| s.value).collect()
    }
}
