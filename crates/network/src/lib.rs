//! Simulated parties running message-driven protocols.
//!
//! Every party is an entity of a [`mpcsim_simulation::Simulation`] and runs
//! one root [`Session`] of a [`Protocol`]. Protocols talk to the network
//! through a [`Context`]: they send, broadcast, and register stage-keyed
//! collections whose continuations run once enough distinct senders have
//! spoken.
//!
//! ```text
//!  Protocol::start ──► ctx.broadcast(Share)  ──► Transport::dispatch
//!                      ctx.on_receive(k, t, f)        │ schedule delivery
//!                                                     ▼
//!  Party::deliver ──► Session::handle ──► Mailbox (key → round of envelopes)
//!                                              │ t distinct senders
//!                                              ▼
//!                                     continuation f(protocol, ctx, envelopes)
//! ```
//!
//! [`Multiplexer`] hosts one sub-session per quorum on a single party and
//! routes by the envelope's group.
//!
//! # Example
//!
//! ```
//! use mpcsim_core::{Envelope, Message, PartyId};
//! use mpcsim_network::{Context, Network, NetworkConfig, Protocol, ProtocolError};
//!
//! #[derive(Debug, Clone)]
//! struct Hello(u32);
//!
//! impl Message for Hello {
//!     type Key = ();
//!     fn key(&self) {}
//!     fn size(&self) -> usize {
//!         4
//!     }
//! }
//!
//! struct Greeter;
//!
//! impl Protocol for Greeter {
//!     type Message = Hello;
//!     type Output = u32;
//!
//!     fn start(&mut self, ctx: &mut Context<'_, Self>) -> Result<(), ProtocolError> {
//!         let n = ctx.peers().len();
//!         ctx.on_receive((), n, |_: &mut Greeter, ctx, hellos: Vec<Envelope<Hello>>| {
//!             ctx.complete(hellos.iter().map(|h| h.payload.0).sum())
//!         })?;
//!         let me = ctx.me().0;
//!         ctx.broadcast(Hello(me))
//!     }
//! }
//!
//! let mut network = Network::new(NetworkConfig::default());
//! for id in 0..3 {
//!     network.add_party(PartyId(id), Greeter).unwrap();
//! }
//! let report = network.run().unwrap();
//! assert!(report.all_completed());
//! assert_eq!(report.messages_sent, 9);
//! assert_eq!(network.output(PartyId(1)), Some(&3));
//! ```

mod config;
mod context;
mod diagnostics;
mod error;
mod mailbox;
mod multiplexer;
mod network;
mod party;
mod protocol;
mod session;
mod traffic;

pub use config::{ExecutionModel, NetworkConfig};
pub use context::Context;
pub use diagnostics::Diagnostic;
pub use error::{NetworkError, ProtocolError};
pub use multiplexer::Multiplexer;
pub use network::{Network, NetworkReport};
pub use party::{party_seed, Party};
pub use protocol::{Continuation, Protocol, SessionState, Transport};
pub use session::Session;
pub use traffic::{BandwidthReport, KindReport, PartyTraffic, TrafficAnalyzer, AGREEMENT_OVERHEAD};
