//! Number-theoretic helpers over machine-width moduli.

use crate::FieldError;
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;

/// Witness bases that make Miller-Rabin deterministic for every `u64`.
const MR_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Multiply modulo `m` without overflow.
#[inline]
pub fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// Add modulo `m` without overflow. Both operands must already be reduced.
#[inline]
pub fn add_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 + b as u128) % m as u128) as u64
}

/// Modular exponentiation by repeated squaring.
pub fn mod_pow(base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut result = 1u64;
    let mut base = base % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Extended Euclid: returns `(g, x, y)` with `a*x + b*y = g = gcd(a, b)`.
pub fn extended_gcd(a: i128, b: i128) -> (i128, i128, i128) {
    let (mut old_r, mut r) = (a, b);
    let (mut old_s, mut s) = (1i128, 0i128);
    let (mut old_t, mut t) = (0i128, 1i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
        (old_t, t) = (t, old_t - q * t);
    }
    (old_r, old_s, old_t)
}

/// Multiplicative inverse of `a` modulo `m`, if it exists.
pub fn mod_inverse(a: u64, m: u64) -> Option<u64> {
    if m < 2 {
        return None;
    }
    let (g, x, _) = extended_gcd((a % m) as i128, m as i128);
    if g != 1 {
        return None;
    }
    Some(x.rem_euclid(m as i128) as u64)
}

/// Deterministic primality test for any `u64`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in MR_BASES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for a in MR_BASES {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Smallest prime greater than or equal to `n`, or `None` past `u64::MAX`.
pub fn next_prime(n: u64) -> Option<u64> {
    let mut candidate = n.max(2);
    loop {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_add(1)?;
    }
}

fn distinct_prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut p = 2u64;
    while p.saturating_mul(p) <= n {
        if n % p == 0 {
            factors.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// The smallest generator of the multiplicative group of `Z_prime`.
///
/// Fails with [`FieldError::NotPrime`] when `prime` is composite, since the
/// group is then not cyclic in general.
pub fn min_primitive_root(prime: u64) -> Result<u64, FieldError> {
    if !is_prime(prime) {
        return Err(FieldError::NotPrime(prime));
    }
    if prime == 2 {
        return Ok(1);
    }
    let order = prime - 1;
    let factors = distinct_prime_factors(order);
    (2..prime)
        .find(|&g| factors.iter().all(|&q| mod_pow(g, order / q, prime) != 1))
        .ok_or(FieldError::NotPrime(prime))
}

/// Table `inv[a] = a^-1 mod prime` for every `a` in `1..prime`; `inv[0] = 0`.
///
/// Only sensible for small primes.
pub fn inverse_table(prime: u64) -> Result<Vec<u64>, FieldError> {
    if !is_prime(prime) {
        return Err(FieldError::NotPrime(prime));
    }
    let len = usize::try_from(prime).map_err(|_| FieldError::InvalidModulus(prime.to_string()))?;
    let mut inv = vec![0u64; len];
    if len > 1 {
        inv[1] = 1;
    }
    for i in 2..len {
        let q = prime / i as u64;
        let r = (prime % i as u64) as usize;
        inv[i] = mul_mod(prime - q, inv[r], prime);
    }
    Ok(inv)
}

/// Probabilistic Miller-Rabin for arbitrary-precision candidates.
pub fn is_probable_prime_big<R: Rng + ?Sized>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    if let Some(small) = n.to_u64_digits().first().copied().filter(|_| n.bits() <= 64) {
        return is_prime(small);
    }
    if (n % &two).is_zero() {
        return false;
    }

    let n_minus_one = n - &one;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while (&d % &two).is_zero() {
        d >>= 1;
        s += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
