//! Machine-width prime field elements.

use crate::numtheory::{add_mod, mod_inverse, mod_pow, mul_mod};
use crate::FieldError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// An element of `Z_p` carried together with its modulus.
///
/// The value is always reduced into `[0, prime)`. Arithmetic between elements
/// of different fields is a programming error and panics; use
/// [`Zp::same_field`] to check first when operands come from untrusted
/// places. Division goes through [`Zp::try_div`] because a zero divisor is an
/// ordinary outcome callers must handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zp {
    value: u64,
    prime: u64,
}

impl Zp {
    /// Create `value mod prime`.
    ///
    /// # Panics
    ///
    /// Panics if `prime < 2`.
    pub fn new(prime: u64, value: u64) -> Self {
        assert!(prime >= 2, "field modulus must be at least 2, got {prime}");
        Self {
            value: value % prime,
            prime,
        }
    }

    /// Create an element from a possibly negative integer.
    pub fn from_signed(prime: u64, value: i64) -> Self {
        assert!(prime >= 2, "field modulus must be at least 2, got {prime}");
        let reduced = (value as i128).rem_euclid(prime as i128) as u64;
        Self {
            value: reduced,
            prime,
        }
    }

    pub fn zero(prime: u64) -> Self {
        Self::new(prime, 0)
    }

    pub fn one(prime: u64) -> Self {
        Self::new(prime, 1)
    }

    /// Uniformly random element of `Z_prime`.
    pub fn random<R: Rng + ?Sized>(prime: u64, rng: &mut R) -> Self {
        Self::new(prime, rng.gen_range(0..prime))
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline]
    pub fn prime(&self) -> u64 {
        self.prime
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    #[inline]
    pub fn same_field(&self, other: &Self) -> bool {
        self.prime == other.prime
    }

    /// Multiplicative inverse; fails for zero.
    pub fn inverse(&self) -> Result<Self, FieldError> {
        if self.is_zero() {
            return Err(FieldError::DivisionByZero);
        }
        mod_inverse(self.value, self.prime)
            .map(|inv| Self {
                value: inv,
                prime: self.prime,
            })
            .ok_or(FieldError::DivisionByZero)
    }

    /// `self / rhs`, failing when `rhs` is zero.
    pub fn try_div(self, rhs: Self) -> Result<Self, FieldError> {
        self.check_field(&rhs);
        Ok(self * rhs.inverse()?)
    }

    pub fn pow(&self, exp: u64) -> Self {
        Self {
            value: mod_pow(self.value, exp, self.prime),
            prime: self.prime,
        }
    }

    /// Evaluate the polynomial with the given coefficients (lowest degree
    /// first) at `self`.
    pub fn evaluate_polynomial(&self, coeffs: &[Zp]) -> Zp {
        coeffs
            .iter()
            .rev()
            .fold(Zp::zero(self.prime), |acc, &c| acc * *self + c)
    }

    #[inline]
    fn check_field(&self, other: &Self) {
        assert_eq!(
            self.prime, other.prime,
            "cannot combine elements of Z_{} and Z_{}",
            self.prime, other.prime
        );
    }
}

impl fmt::Debug for Zp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mod {})", self.value, self.prime)
    }
}

impl fmt::Display for Zp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Add for Zp {
    type Output = Zp;

    fn add(self, rhs: Zp) -> Zp {
        self.check_field(&rhs);
        Zp {
            value: add_mod(self.value, rhs.value, self.prime),
            prime: self.prime,
        }
    }
}

impl Sub for Zp {
    type Output = Zp;

    fn sub(self, rhs: Zp) -> Zp {
        self + (-rhs)
    }
}

impl Mul for Zp {
    type Output = Zp;

    fn mul(self, rhs: Zp) -> Zp {
        self.check_field(&rhs);
        Zp {
            value: mul_mod(self.value, rhs.value, self.prime),
            prime: self.prime,
        }
    }
}

impl Neg for Zp {
    type Output = Zp;

    fn neg(self) -> Zp {
        let value = if self.value == 0 {
            0
        } else {
            self.prime - self.value
        };
        Zp {
            value,
            prime: self.prime,
        }
    }
}

impl AddAssign for Zp {
    fn add_assign(&mut self, rhs: Zp) {
        *self = *self + rhs;
    }
}

impl SubAssign for Zp {
    fn sub_assign(&mut self, rhs: Zp) {
        *self = *self - rhs;
    }
}

impl MulAssign for Zp {
    fn mul_assign(&mut self, rhs: Zp) {
        *self = *self * rhs;
    }
}
