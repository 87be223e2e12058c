//! Prime-field arithmetic for the MPC simulator.
//!
//! This crate is the leaf of the workspace. It provides:
//!
//! - [`Zp`]: machine-width field elements (`u64` modulus, `u128` products)
//! - [`BigZp`]: arbitrary-precision field elements backed by `num-bigint`
//! - [`FieldElement`]: the operations interpolation needs from either
//! - [`ZpMatrix`]: dense matrices with Vandermonde constructors, row
//!   reduction, inversion and linear solving
//! - [`Polynomial`]: evaluation, arithmetic, division and interpolation
//! - [`numtheory`]: modular exponentiation, inverses, primality and
//!   primitive roots
//!
//! # Example
//!
//! ```
//! use mpcsim_field::{Polynomial, Zp};
//!
//! let f = Polynomial::new(29, vec![Zp::new(29, 3), Zp::new(29, 2)]);
//! assert_eq!(f.evaluate(Zp::new(29, 5)).value(), 13);
//! ```

mod big;
mod element;
mod error;
mod matrix;
pub mod numtheory;
mod polynomial;
mod zp;

pub use big::BigZp;
pub use element::FieldElement;
pub use error::FieldError;
pub use matrix::ZpMatrix;
pub use polynomial::Polynomial;
pub use zp::Zp;
