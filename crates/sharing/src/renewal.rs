//! Share renewal and resharing between party sets.
//!
//! Renewal: every party deals a sharing of zero; each party adds the update
//! shares it receives to its own share. The secret is unchanged while the
//! old shares stop being combinable with new ones.
//!
//! Resharing: each holder of a share deals a fresh sharing of that share to
//! a destination set. A destination party combines the sub-shares it
//! received with the Lagrange coefficients of the source points and obtains
//! a share of the original secret under a new polynomial.

use crate::shamir::{lagrange_coefficients_at_zero, share, share_at, Share};
use crate::{SharingError, SharingResult};
use mpcsim_field::Zp;
use rand::Rng;

/// A sharing of zero among `num_parties` parties, used as a renewal update.
pub fn zero_sharing<R: Rng + ?Sized>(
    prime: u64,
    num_parties: usize,
    degree: usize,
    rng: &mut R,
) -> SharingResult<Vec<Share>> {
    share(Zp::zero(prime), num_parties, degree, rng)
}

/// Add the update values a party received to its share.
pub fn refresh_share(share: &Share, updates: &[Zp]) -> Share {
    let value = updates.iter().fold(share.value, |acc, &u| acc + u);
    Share {
        point: share.point,
        value,
    }
}

/// Deal a sharing of `share.value` to the destination points.
pub fn reshare<R: Rng + ?Sized>(
    share: &Share,
    destination_points: &[Zp],
    degree: usize,
    rng: &mut R,
) -> SharingResult<Vec<Share>> {
    share_at(share.value, destination_points, degree, rng)
}

/// Combine sub-shares received by one destination party.
///
/// `sub_shares` pairs each source party's evaluation point with the sub-share
/// it dealt to this party. At least `source_degree + 1` sources are needed.
pub fn combine_reshares(sub_shares: &[(Zp, Zp)], source_degree: usize) -> SharingResult<Zp> {
    let required = source_degree + 1;
    let Some(&(first, _)) = sub_shares.first() else {
        return Err(SharingError::InsufficientShares {
            provided: 0,
            required,
        });
    };
    if sub_shares.len() < required {
        return Err(SharingError::InsufficientShares {
            provided: sub_shares.len(),
            required,
        });
    }
    let points: Vec<Zp> = sub_shares.iter().map(|(p, _)| *p).collect();
    let lambdas = lagrange_coefficients_at_zero(&points)?;
    Ok(lambdas
        .into_iter()
        .zip(sub_shares)
        .fold(Zp::zero(first.prime()), |acc, (l, (_, v))| acc + l * *v))
}
