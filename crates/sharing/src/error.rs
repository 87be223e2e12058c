//! Error types for sharing and reconstruction.

use mpcsim_field::FieldError;
use thiserror::Error;

/// Result type for sharing operations.
pub type SharingResult<T> = Result<T, SharingError>;

/// Caller contract violations in sharing and reconstruction.
///
/// Decoding failures of the Welch-Berlekamp decoder are not errors; they are
/// reported as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharingError {
    /// Sharing among `parties` with a polynomial of degree `degree` would
    /// not hide the secret.
    #[error("cannot share among {parties} parties with degree {degree}: need more parties than the degree")]
    InsufficientParties { parties: usize, degree: usize },

    /// Fewer than `degree + 1` shares were supplied.
    #[error("{provided} shares provided, at least {required} required")]
    InsufficientShares { provided: usize, required: usize },

    /// Zero is not a valid evaluation point since it is the secret itself.
    #[error("evaluation point zero is reserved for the secret")]
    ZeroPoint,

    /// Two evaluation points coincide, so reconstruction would divide by
    /// zero.
    #[error("evaluation points at positions {first} and {second} coincide")]
    DuplicatePoint { first: usize, second: usize },

    #[error("{what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("share is over Z_{actual}, expected Z_{expected}")]
    WrongField { expected: u64, actual: u64 },

    #[error(transparent)]
    Field(#[from] FieldError),
}
