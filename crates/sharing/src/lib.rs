//! Threshold secret sharing over prime fields.
//!
//! # Provided operations
//!
//! - [`share`] / [`share_at`] / [`share_primitive`]: Shamir sharing at
//!   contiguous, explicit or primitive-root evaluation points
//! - [`recombine`]: Lagrange reconstruction from `degree + 1` shares
//! - [`welch_berlekamp_decode`]: reconstruction tolerating corrupted shares
//! - [`zero_sharing`] / [`refresh_share`]: proactive share renewal
//! - [`reshare`] / [`combine_reshares`]: moving a sharing to a new party set
//!
//! Randomness is always injected by the caller so simulations stay
//! reproducible from a single seed.
//!
//! # Scope
//!
//! Shares carry no authentication. Resistance to malicious parties comes only
//! from the error-correcting decoder, within its error budget.

mod error;
mod renewal;
mod shamir;
mod welch_berlekamp;

pub use error::{SharingError, SharingResult};
pub use renewal::{combine_reshares, refresh_share, reshare, zero_sharing};
pub use shamir::{
    contiguous_points, lagrange_coefficients_at_zero, recombine, recombine_generic, share,
    share_at, share_detailed, share_generic, share_primitive, Share, ShareDetails,
};
pub use welch_berlekamp::{decode_polynomial, robust_recombine, welch_berlekamp_decode};
