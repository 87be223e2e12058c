//! Shamir threshold sharing and Lagrange reconstruction.
//!
//! A secret `s` is hidden as the constant term of a random polynomial `f` of
//! degree `d`. Party `i` receives `f(x_i)`. Any `d + 1` shares determine `f`
//! and therefore `s`; any `d` shares are consistent with every possible
//! secret.

use crate::{SharingError, SharingResult};
use mpcsim_field::{numtheory, FieldElement, FieldError, Polynomial, Zp, ZpMatrix};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One evaluation of a sharing polynomial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Share<F = Zp> {
    /// Evaluation point (x-coordinate). Never zero.
    pub point: F,
    /// Polynomial value at `point`.
    pub value: F,
}

impl<F> Share<F> {
    pub fn new(point: F, value: F) -> Self {
        Self { point, value }
    }
}

/// Shares together with the polynomial that produced them.
#[derive(Debug, Clone)]
pub struct ShareDetails {
    pub polynomial: Polynomial,
    pub shares: Vec<Share>,
}

/// The contiguous evaluation points `1..=n` in `Z_prime`.
pub fn contiguous_points(prime: u64, n: usize) -> Vec<Zp> {
    (1..=n as u64).map(|x| Zp::new(prime, x)).collect()
}

/// Share `secret` among `num_parties` parties at points `1..=num_parties`.
///
/// The shares are computed as the product of a random `1 × (degree + 1)`
/// coefficient row (with the secret as the constant term) and the
/// `(degree + 1) × num_parties` Vandermonde matrix.
pub fn share<R: Rng + ?Sized>(
    secret: Zp,
    num_parties: usize,
    degree: usize,
    rng: &mut R,
) -> SharingResult<Vec<Share>> {
    Ok(share_detailed(secret, num_parties, degree, rng)?.shares)
}

/// Like [`share`], also returning the sharing polynomial.
pub fn share_detailed<R: Rng + ?Sized>(
    secret: Zp,
    num_parties: usize,
    degree: usize,
    rng: &mut R,
) -> SharingResult<ShareDetails> {
    check_degree(num_parties, degree)?;
    let prime = secret.prime();
    let points = contiguous_points(prime, num_parties);
    // Points 1..=n collide modulo small primes.
    check_points(&points)?;

    let mut coeffs = ZpMatrix::random(1, degree + 1, prime, rng);
    coeffs.set(0, 0, secret);
    let vandermonde = ZpMatrix::vandermonde(degree + 1, num_parties, prime);
    let values = coeffs.times(&vandermonde)?.row(0);

    Ok(ShareDetails {
        polynomial: Polynomial::new(prime, coeffs.row(0)),
        shares: points
            .into_iter()
            .zip(values)
            .map(|(point, value)| Share { point, value })
            .collect(),
    })
}

/// Share `secret` at an explicit set of distinct, non-zero points.
pub fn share_at<R: Rng + ?Sized>(
    secret: Zp,
    points: &[Zp],
    degree: usize,
    rng: &mut R,
) -> SharingResult<Vec<Share>> {
    check_degree(points.len(), degree)?;
    check_points(points)?;
    let prime = secret.prime();
    if let Some(p) = points.iter().find(|p| p.prime() != prime) {
        return Err(SharingError::WrongField {
            expected: prime,
            actual: p.prime(),
        });
    }

    let f = Polynomial::sample(secret, degree, rng);
    Ok(points
        .iter()
        .map(|&point| Share {
            point,
            value: f.evaluate(point),
        })
        .collect())
}

/// Share `secret` at the powers `w^0, w^1, ...` of the field's minimum
/// primitive root.
pub fn share_primitive<R: Rng + ?Sized>(
    secret: Zp,
    num_parties: usize,
    degree: usize,
    rng: &mut R,
) -> SharingResult<Vec<Share>> {
    check_degree(num_parties, degree)?;
    let prime = secret.prime();
    let w = Zp::new(prime, numtheory::min_primitive_root(prime)?);
    let points: Vec<Zp> = (0..num_parties as u64).map(|j| w.pow(j)).collect();
    share_at(secret, &points, degree, rng)
}

/// Share over any field representation, including [`mpcsim_field::BigZp`].
pub fn share_generic<F: FieldElement, R: Rng + ?Sized>(
    secret: &F,
    points: &[F],
    degree: usize,
    rng: &mut R,
) -> SharingResult<Vec<Share<F>>> {
    check_degree(points.len(), degree)?;
    check_points_generic(points)?;
    let mut coeffs = Vec::with_capacity(degree + 1);
    coeffs.push(secret.clone());
    coeffs.extend((0..degree).map(|_| secret.random_like(rng)));

    Ok(points
        .iter()
        .map(|x| {
            let value = coeffs
                .iter()
                .rev()
                .fold(secret.zero_like(), |acc, c| acc * x.clone() + c.clone());
            Share {
                point: x.clone(),
                value,
            }
        })
        .collect())
}

/// Recover the secret from at least `degree + 1` shares over `Z_prime`.
///
/// The first `degree + 1` shares are interpolated at zero. Supplying fewer
/// shares is a caller error, never a default value.
pub fn recombine(shares: &[Share], degree: usize, prime: u64) -> SharingResult<Zp> {
    if let Some(s) = shares
        .iter()
        .find(|s| s.point.prime() != prime || s.value.prime() != prime)
    {
        return Err(SharingError::WrongField {
            expected: prime,
            actual: if s.point.prime() != prime {
                s.point.prime()
            } else {
                s.value.prime()
            },
        });
    }
    recombine_generic(shares, degree)
}

/// Lagrange reconstruction at zero over any field representation.
pub fn recombine_generic<F: FieldElement>(shares: &[Share<F>], degree: usize) -> SharingResult<F> {
    let required = degree + 1;
    if shares.len() < required {
        return Err(SharingError::InsufficientShares {
            provided: shares.len(),
            required,
        });
    }
    let used = &shares[..required];
    let points: Vec<F> = used.iter().map(|s| s.point.clone()).collect();
    let lambdas = lagrange_coefficients_at_zero(&points)?;

    let zero = used[0].value.zero_like();
    Ok(lambdas
        .into_iter()
        .zip(used)
        .fold(zero, |acc, (l, s)| acc + l * s.value.clone()))
}

/// Coefficients `λ_i` with `f(0) = Σ λ_i f(x_i)` for every polynomial of
/// degree `< points.len()`.
pub fn lagrange_coefficients_at_zero<F: FieldElement>(points: &[F]) -> SharingResult<Vec<F>> {
    let mut lambdas = Vec::with_capacity(points.len());
    for (i, xi) in points.iter().enumerate() {
        let mut num = xi.one_like();
        let mut den = xi.one_like();
        for (j, xj) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            if !xi.same_field(xj) {
                return Err(FieldError::ModulusMismatch {
                    left: format!("{xi:?}"),
                    right: format!("{xj:?}"),
                }
                .into());
            }
            // λ_i = Π_{j≠i} (0 - x_j) / (x_i - x_j)
            num = num * (-xj.clone());
            den = den * (xi.clone() - xj.clone());
        }
        lambdas.push(num.try_div(&den)?);
    }
    Ok(lambdas)
}

fn check_degree(parties: usize, degree: usize) -> SharingResult<()> {
    if parties <= degree {
        return Err(SharingError::InsufficientParties { parties, degree });
    }
    Ok(())
}

fn check_points(points: &[Zp]) -> SharingResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(points.len());
    for p in points {
        if p.is_zero() {
            return Err(SharingError::ZeroPoint);
        }
        if !seen.insert(p.value()) {
            return Err(FieldError::DuplicatePoint(p.value()).into());
        }
    }
    Ok(())
}

/// Nonzero, pairwise distinct points for any representation.
fn check_points_generic<F: FieldElement>(points: &[F]) -> SharingResult<()> {
    for (second, p) in points.iter().enumerate() {
        if p.is_zero() {
            return Err(SharingError::ZeroPoint);
        }
        if let Some(first) = points[..second].iter().position(|q| q == p) {
            return Err(SharingError::DuplicatePoint { first, second });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const P: u64 = 29;

    #[test]
    fn test_generic_sharing_rejects_repeated_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let points: Vec<Zp> = [1, 2, 3, 2].iter().map(|&x| Zp::new(P, x)).collect();
        assert_eq!(
            share_generic(&Zp::new(P, 5), &points, 1, &mut rng),
            Err(SharingError::DuplicatePoint { first: 1, second: 3 })
        );
        let points = [Zp::new(P, 4), Zp::new(P, 0)];
        assert_eq!(
            share_generic(&Zp::new(P, 5), &points, 1, &mut rng),
            Err(SharingError::ZeroPoint)
        );
    }

    #[test]
    fn test_share_points_are_one_based() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let shares = share(Zp::new(P, 5), 4, 2, &mut rng).unwrap();
        let points: Vec<u64> = shares.iter().map(|s| s.point.value()).collect();
        assert_eq!(points, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_detailed_share_matches_polynomial() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let details = share_detailed(Zp::new(P, 26), 5, 2, &mut rng).unwrap();
        assert_eq!(details.polynomial.coefficient(0), Zp::new(P, 26));
        for s in &details.shares {
            assert_eq!(details.polynomial.evaluate(s.point), s.value);
        }
    }

    #[test]
    fn test_degree_precondition() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(
            share(Zp::new(P, 1), 3, 3, &mut rng),
            Err(SharingError::InsufficientParties {
                parties: 3,
                degree: 3
            })
        );
    }

    #[test]
    fn test_too_few_shares() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let shares = share(Zp::new(P, 9), 5, 2, &mut rng).unwrap();
        assert_eq!(
            recombine(&shares[..2], 2, P),
            Err(SharingError::InsufficientShares {
                provided: 2,
                required: 3
            })
        );
    }

    #[test]
    fn test_points_colliding_mod_prime_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        // 29 ≡ 0 mod 29.
        assert_eq!(
            share(Zp::new(P, 1), 29, 3, &mut rng),
            Err(SharingError::ZeroPoint)
        );
    }

    #[test]
    fn test_primitive_share_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let shares = share_primitive(Zp::new(P, 17), 6, 2, &mut rng).unwrap();
        assert_eq!(shares[1].point, Zp::new(P, 2));
        assert_eq!(recombine(&shares[3..], 2, P).unwrap(), Zp::new(P, 17));
    }

    #[test]
    fn test_lagrange_coefficients_sum_to_one() {
        // Reconstructing the constant polynomial 1 yields Σ λ_i = 1.
        let points = contiguous_points(P, 4);
        let lambdas = lagrange_coefficients_at_zero(&points).unwrap();
        let sum = lambdas.into_iter().fold(Zp::zero(P), |a, b| a + b);
        assert_eq!(sum, Zp::one(P));
    }

    #[test]
    fn test_wrong_field_rejected() {
        let shares = vec![
            Share::new(Zp::new(31, 1), Zp::new(31, 1)),
            Share::new(Zp::new(31, 2), Zp::new(31, 2)),
        ];
        assert_eq!(
            recombine(&shares, 1, P),
            Err(SharingError::WrongField {
                expected: P,
                actual: 31
            })
        );
    }
}
