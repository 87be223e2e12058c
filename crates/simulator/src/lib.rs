//! MPC Simulator
//!
//! Reference scenarios run over the simulated network:
//!
//! - **Secret sum**: Shamir-shared inputs, summed share-wise and opened with
//!   Welch-Berlekamp error correction
//! - **Majority filter**: receivers keep the value a strict majority sent
//! - **Quorum reshare**: a secret moves from one quorum to another through
//!   per-quorum sessions hosted by a multiplexer
//! - **Share renewal**: shares refreshed with sharings of zero
//!
//! # Example
//!
//! ```
//! use mpcsim_simulator::{Scenario, Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(Scenario::SecretSum, 5)
//!     .with_degree(1)
//!     .with_corrupt(1)
//!     .with_seed(42);
//! let report = Simulator::new(config).unwrap().run().unwrap();
//! assert!(report.is_correct());
//! ```

mod config;
mod error;
mod report;
mod runner;
pub mod scenarios;

pub use config::{Scenario, SimulatorConfig};
pub use error::SimulatorError;
pub use report::ScenarioReport;
pub use runner::Simulator;
