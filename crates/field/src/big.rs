//! Arbitrary-precision prime field elements.

use crate::FieldError;
use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_traits::{One, Zero};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

/// An element of `Z_p` for primes that do not fit a machine word.
///
/// The modulus is shared behind an `Arc` so cloning an element does not copy
/// the prime.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BigZp {
    value: BigUint,
    prime: Arc<BigUint>,
}

impl BigZp {
    /// Create `value mod prime`.
    ///
    /// # Panics
    ///
    /// Panics if `prime < 2`.
    pub fn new(prime: Arc<BigUint>, value: BigUint) -> Self {
        assert!(
            *prime >= BigUint::from(2u32),
            "field modulus must be at least 2"
        );
        let value = value % prime.as_ref();
        Self { value, prime }
    }

    pub fn from_u64(prime: Arc<BigUint>, value: u64) -> Self {
        Self::new(prime, BigUint::from(value))
    }

    /// Create an element from a signed big integer.
    pub fn from_signed(prime: Arc<BigUint>, value: &BigInt) -> Self {
        let modulus = BigInt::from_biguint(Sign::Plus, prime.as_ref().clone());
        let mut reduced = value % &modulus;
        if reduced.sign() == Sign::Minus {
            reduced += &modulus;
        }
        let value = reduced.to_biguint().unwrap_or_default();
        Self::new(prime, value)
    }

    pub fn zero(prime: Arc<BigUint>) -> Self {
        Self::new(prime, BigUint::zero())
    }

    pub fn one(prime: Arc<BigUint>) -> Self {
        Self::new(prime, BigUint::one())
    }

    pub fn random<R: Rng + ?Sized>(prime: Arc<BigUint>, rng: &mut R) -> Self {
        let value = rng.gen_biguint_below(prime.as_ref());
        Self { value, prime }
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn prime(&self) -> &Arc<BigUint> {
        &self.prime
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn same_field(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.prime, &other.prime) || self.prime == other.prime
    }

    /// Multiplicative inverse via Fermat's little theorem.
    pub fn inverse(&self) -> Result<Self, FieldError> {
        if self.is_zero() {
            return Err(FieldError::DivisionByZero);
        }
        let exp = self.prime.as_ref() - BigUint::from(2u32);
        Ok(Self {
            value: self.value.modpow(&exp, &self.prime),
            prime: self.prime.clone(),
        })
    }

    pub fn try_div(&self, rhs: &Self) -> Result<Self, FieldError> {
        self.check_field(rhs);
        Ok(self * &rhs.inverse()?)
    }

    pub fn pow(&self, exp: &BigUint) -> Self {
        Self {
            value: self.value.modpow(exp, &self.prime),
            prime: self.prime.clone(),
        }
    }

    fn check_field(&self, other: &Self) {
        assert!(
            self.same_field(other),
            "cannot combine elements of Z_{} and Z_{}",
            self.prime,
            other.prime
        );
    }
}

impl fmt::Debug for BigZp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mod {})", self.value, self.prime)
    }
}

impl fmt::Display for BigZp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<'a> Add<&'a BigZp> for &'a BigZp {
    type Output = BigZp;

    fn add(self, rhs: &'a BigZp) -> BigZp {
        self.check_field(rhs);
        BigZp {
            value: (&self.value + &rhs.value) % self.prime.as_ref(),
            prime: self.prime.clone(),
        }
    }
}

impl<'a> Sub<&'a BigZp> for &'a BigZp {
    type Output = BigZp;

    fn sub(self, rhs: &'a BigZp) -> BigZp {
        self + &(-rhs)
    }
}

impl<'a> Mul<&'a BigZp> for &'a BigZp {
    type Output = BigZp;

    fn mul(self, rhs: &'a BigZp) -> BigZp {
        self.check_field(rhs);
        BigZp {
            value: (&self.value * &rhs.value) % self.prime.as_ref(),
            prime: self.prime.clone(),
        }
    }
}

impl Neg for &BigZp {
    type Output = BigZp;

    fn neg(self) -> BigZp {
        let value = if self.value.is_zero() {
            BigUint::zero()
        } else {
            self.prime.as_ref() - &self.value
        };
        BigZp {
            value,
            prime: self.prime.clone(),
        }
    }
}

impl Add for BigZp {
    type Output = BigZp;

    fn add(self, rhs: BigZp) -> BigZp {
        &self + &rhs
    }
}

impl Sub for BigZp {
    type Output = BigZp;

    fn sub(self, rhs: BigZp) -> BigZp {
        &self - &rhs
    }
}

impl Mul for BigZp {
    type Output = BigZp;

    fn mul(self, rhs: BigZp) -> BigZp {
        &self * &rhs
    }
}

impl Neg for BigZp {
    type Output = BigZp;

    fn neg(self) -> BigZp {
        -&self
    }
}
