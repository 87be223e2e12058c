//! Errors raised by field, matrix and polynomial operations.

use thiserror::Error;

/// Errors that can occur in field arithmetic and linear algebra.
///
/// Division by zero is an expected outcome that callers branch on; the
/// remaining variants describe malformed inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("modulus {0} is not prime")]
    NotPrime(u64),

    #[error("invalid modulus {0}: must be at least 2")]
    InvalidModulus(String),

    #[error("operands belong to different fields ({left} vs {right})")]
    ModulusMismatch { left: String, right: String },

    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("matrix is singular")]
    SingularMatrix,

    #[error("duplicate evaluation point {0}")]
    DuplicatePoint(u64),
}
