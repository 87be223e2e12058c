//! Representation-independent field element trait.

use crate::{BigZp, FieldError, Zp};
use num_bigint::BigUint;
use rand::Rng;
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

/// Operations that interpolation and sharing need from a field element.
///
/// Every constructor is relative to an existing element (`*_like`) because
/// the modulus travels with the value rather than with the type.
pub trait FieldElement:
    Clone
    + PartialEq
    + Eq
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    fn zero_like(&self) -> Self;
    fn one_like(&self) -> Self;
    fn from_u64_like(&self, value: u64) -> Self;
    fn random_like<R: Rng + ?Sized>(&self, rng: &mut R) -> Self;
    fn is_zero(&self) -> bool;
    fn inverse(&self) -> Result<Self, FieldError>;
    fn same_field(&self, other: &Self) -> bool;

    fn try_div(&self, rhs: &Self) -> Result<Self, FieldError> {
        Ok(self.clone() * rhs.inverse()?)
    }
}

impl FieldElement for Zp {
    fn zero_like(&self) -> Self {
        Zp::zero(self.prime())
    }

    fn one_like(&self) -> Self {
        Zp::one(self.prime())
    }

    fn from_u64_like(&self, value: u64) -> Self {
        Zp::new(self.prime(), value)
    }

    fn random_like<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Zp::random(self.prime(), rng)
    }

    fn is_zero(&self) -> bool {
        Zp::is_zero(self)
    }

    fn inverse(&self) -> Result<Self, FieldError> {
        Zp::inverse(self)
    }

    fn same_field(&self, other: &Self) -> bool {
        Zp::same_field(self, other)
    }
}

impl FieldElement for BigZp {
    fn zero_like(&self) -> Self {
        BigZp::zero(self.prime().clone())
    }

    fn one_like(&self) -> Self {
        BigZp::one(self.prime().clone())
    }

    fn from_u64_like(&self, value: u64) -> Self {
        BigZp::new(self.prime().clone(), BigUint::from(value))
    }

    fn random_like<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        BigZp::random(self.prime().clone(), rng)
    }

    fn is_zero(&self) -> bool {
        BigZp::is_zero(self)
    }

    fn inverse(&self) -> Result<Self, FieldError> {
        BigZp::inverse(self)
    }

    fn same_field(&self, other: &Self) -> bool {
        BigZp::same_field(self, other)
    }
}
