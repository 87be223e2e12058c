//! Core types for the MPC simulator.
//!
//! This crate provides the vocabulary shared by protocols and the network:
//!
//! - [`PartyId`], [`GroupId`], [`VirtualId`]: who a message is from and which
//!   protocol instance it belongs to
//! - [`Message`]: a typed payload with a stage key and a size for accounting
//! - [`Envelope`]: a message in flight with its routing metadata
//! - [`Quorum`]: an ordered member set with fault thresholds
//!
//! # Stage keys
//!
//! Concurrent sub-protocols on one party are told apart purely by their
//! [`Message::key`]. Two messages belong to the same collection round exactly
//! when their keys are equal, so a key usually combines a stage tag with
//! whatever distinguishes parallel instances (gate index, quorum, round).

mod ids;
mod message;
mod quorum;

pub use ids::{GroupId, PartyId, VirtualId};
pub use message::{Envelope, Message, StateKey};
pub use quorum::{generate_quorums, Quorum, QuorumError};
