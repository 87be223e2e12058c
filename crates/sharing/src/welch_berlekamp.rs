//! Welch-Berlekamp error-correcting decoder for Reed-Solomon codewords.
//!
//! Given `n` points `(x_i, y_i)` of which at most `e` are wrong, find the
//! degree-`d` polynomial `P` that agrees with the rest. Unknowns are a monic
//! error locator `E` of degree `e` and a numerator `Q` with `n - e`
//! coefficients satisfying
//!
//! ```text
//! Q(x_i) = y_i · E(x_i)        for every i
//! ```
//!
//! which is the linear system `[V_Q | -y · V_E] · (q, e') = (x_i^e · y_i)`.
//! When at most `e` points are corrupted and `n ≥ d + 2e + 1`, every
//! solution satisfies `Q = P · E`, so `P = Q / E`.

use crate::{SharingError, SharingResult};
use mpcsim_field::{FieldError, Polynomial, Zp, ZpMatrix};
use std::collections::HashSet;
use tracing::debug;

/// Decode and return the corrected codeword `P(x_1), ..., P(x_n)`.
///
/// Returns `Ok(None)` when decoding fails: `n < 2 · max_errors`, the linear
/// system is inconsistent, `E` does not divide `Q`, the quotient has degree
/// above `degree`, or it disagrees with more than `max_errors` points.
/// Malformed input (length mismatch, repeated `x`, foreign field) is an
/// `Err`.
pub fn welch_berlekamp_decode(
    xs: &[Zp],
    ys: &[Zp],
    max_errors: usize,
    degree: usize,
    prime: u64,
) -> SharingResult<Option<Vec<Zp>>> {
    let Some(p) = decode_polynomial(xs, ys, max_errors, degree, prime)? else {
        return Ok(None);
    };
    Ok(Some(xs.iter().map(|&x| p.evaluate(x)).collect()))
}

/// Decode and return the recovered polynomial.
pub fn decode_polynomial(
    xs: &[Zp],
    ys: &[Zp],
    max_errors: usize,
    degree: usize,
    prime: u64,
) -> SharingResult<Option<Polynomial>> {
    validate(xs, ys, prime)?;
    let n = xs.len();
    let e = max_errors;
    if n < 2 * e {
        debug!(n, max_errors = e, "too few points to correct the requested errors");
        return Ok(None);
    }

    let q_len = n - e;
    let vq = ZpMatrix::vandermonde_at(q_len, xs, prime)?.transpose();
    let neg_y: Vec<Zp> = ys.iter().map(|&y| -y).collect();
    let ve = ZpMatrix::vandermonde_at(e, xs, prime)?
        .transpose()
        .scale_rows(&neg_y)?;
    let a = ZpMatrix::concat(&vq, &ve)?;
    let b: Vec<Zp> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| x.pow(e as u64) * y)
        .collect();

    let Some(solution) = a.solve(&b)? else {
        debug!(n, max_errors = e, "Welch-Berlekamp system is inconsistent");
        return Ok(None);
    };

    let q = Polynomial::new(prime, solution[..q_len].to_vec());
    let mut e_coeffs = solution[q_len..].to_vec();
    e_coeffs.push(Zp::one(prime));
    let locator = Polynomial::new(prime, e_coeffs);

    let Some(p) = q.div_exact(&locator) else {
        debug!(n, max_errors = e, "error locator does not divide numerator");
        return Ok(None);
    };
    if p.degree().is_some_and(|deg| deg > degree) {
        debug!(n, max_errors = e, degree, got = ?p.degree(), "decoded polynomial exceeds degree bound");
        return Ok(None);
    }

    let disagreements = xs
        .iter()
        .zip(ys)
        .filter(|&(&x, &y)| p.evaluate(x) != y)
        .count();
    if disagreements > e {
        debug!(disagreements, max_errors = e, "decoded polynomial exceeds error budget");
        return Ok(None);
    }
    Ok(Some(p))
}

/// Recover the secret (constant term) from possibly corrupted shares.
pub fn robust_recombine(
    shares: &[crate::Share],
    max_errors: usize,
    degree: usize,
    prime: u64,
) -> SharingResult<Option<Zp>> {
    let xs: Vec<Zp> = shares.iter().map(|s| s.point).collect();
    let ys: Vec<Zp> = shares.iter().map(|s| s.value).collect();
    Ok(decode_polynomial(&xs, &ys, max_errors, degree, prime)?.map(|p| p.coefficient(0)))
}

fn validate(xs: &[Zp], ys: &[Zp], prime: u64) -> SharingResult<()> {
    if xs.len() != ys.len() {
        return Err(SharingError::LengthMismatch {
            what: "y values",
            expected: xs.len(),
            actual: ys.len(),
        });
    }
    let mut seen = HashSet::with_capacity(xs.len());
    for v in xs.iter().chain(ys) {
        if v.prime() != prime {
            return Err(SharingError::WrongField {
                expected: prime,
                actual: v.prime(),
            });
        }
    }
    for x in xs {
        if !seen.insert(x.value()) {
            return Err(FieldError::DuplicatePoint(x.value()).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: u64 = 29;

    fn zp(v: u64) -> Zp {
        Zp::new(P, v)
    }

    fn xs(n: u64) -> Vec<Zp> {
        (1..=n).map(zp).collect()
    }

    #[test]
    fn test_no_errors_is_interpolation() {
        // f(x) = 3 + 2x
        let ys = vec![zp(5), zp(7), zp(9), zp(11), zp(13)];
        let out = welch_berlekamp_decode(&xs(5), &ys, 0, 1, P).unwrap();
        assert_eq!(out, Some(ys));
    }

    #[test]
    fn test_corrects_single_error() {
        let mut ys = vec![zp(5), zp(7), zp(9), zp(11), zp(13)];
        let expected = ys.clone();
        ys[1] = zp(4);
        let out = welch_berlekamp_decode(&xs(5), &ys, 1, 1, P).unwrap();
        assert_eq!(out, Some(expected));
    }

    #[test]
    fn test_two_errors_beyond_budget_fail() {
        let ys = vec![zp(20), zp(4), zp(9), zp(11), zp(13)];
        assert_eq!(welch_berlekamp_decode(&xs(5), &ys, 1, 1, P).unwrap(), None);
    }

    #[test]
    fn test_too_few_points() {
        let ys = vec![zp(5), zp(7), zp(9)];
        assert_eq!(welch_berlekamp_decode(&xs(3), &ys, 2, 1, P).unwrap(), None);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        assert!(matches!(
            welch_berlekamp_decode(&xs(3), &[zp(1)], 0, 1, P),
            Err(SharingError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_robust_recombine_returns_secret() {
        let shares: Vec<crate::Share> = [5u64, 7, 0, 11, 13, 15, 17]
            .iter()
            .enumerate()
            .map(|(i, &y)| crate::Share::new(zp(i as u64 + 1), zp(y)))
            .collect();
        assert_eq!(robust_recombine(&shares, 2, 1, P).unwrap(), Some(zp(3)));
    }
}
