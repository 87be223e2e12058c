//! MPC Simulator CLI
//!
//! Run a reference scenario over the simulated network.
//!
//! # Example
//!
//! ```bash
//! # Secret sum among 7 parties, one of them corrupt, fixed seed
//! mpcsim --scenario secret-sum --parties 7 --corrupt 1 --seed 42
//!
//! # Quorum resharing from a TOML file, run on the parallel driver
//! mpcsim --config reshare.toml --parallel --threads 4
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use mpcsim_network::{ExecutionModel, NetworkConfig};
use mpcsim_simulation::DriverKind;
use mpcsim_simulator::{Scenario, Simulator, SimulatorConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// MPC Simulator
///
/// Runs deterministic multi-party computation scenarios. Reproducible when
/// the same seed is used, on either driver.
#[derive(Parser, Debug)]
#[command(name = "mpcsim")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file. Flags override its values.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Scenario to run (secret_sum, majority_filter, quorum_reshare, share_renewal)
    #[arg(short = 's', long)]
    scenario: Option<Scenario>,

    /// Number of parties
    #[arg(short = 'n', long)]
    parties: Option<usize>,

    /// Degree of the sharing polynomials
    #[arg(short = 'd', long)]
    degree: Option<usize>,

    /// Field prime
    #[arg(long)]
    prime: Option<u64>,

    /// Secret (or base input)
    #[arg(long)]
    secret: Option<u64>,

    /// Number of corrupt parties
    #[arg(long)]
    corrupt: Option<usize>,

    /// Number of quorums to generate
    #[arg(long)]
    quorum_count: Option<usize>,

    /// Members per quorum
    #[arg(long)]
    quorum_size: Option<usize>,

    /// Random seed for reproducible results. When omitted (and not set in the
    /// config file), a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Use the parallel driver
    #[arg(long)]
    parallel: bool,

    /// Worker threads for the parallel driver
    #[arg(long, requires = "parallel")]
    threads: Option<usize>,

    /// Run in lockstep rounds of this many ticks
    #[arg(long, conflicts_with = "jitter")]
    round_length: Option<u64>,

    /// Maximum random jitter added to asynchronous deliveries
    #[arg(long)]
    jitter: Option<u64>,

    /// Print the traffic breakdown by message kind
    #[arg(long)]
    network_analysis: bool,

    /// Print per-party traffic for the busiest parties
    #[arg(long)]
    party_details: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<SimulatorConfig> {
        let (mut config, seed_from_file) = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let config: SimulatorConfig = toml::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?;
                (config, true)
            }
            None => (SimulatorConfig::default(), false),
        };

        if let Some(scenario) = self.scenario {
            config.scenario = scenario;
        }
        if let Some(parties) = self.parties {
            config.parties = parties;
        }
        if let Some(degree) = self.degree {
            config.degree = degree;
        }
        if let Some(prime) = self.prime {
            config.prime = prime;
        }
        if let Some(secret) = self.secret {
            config.secret = secret;
        }
        if let Some(corrupt) = self.corrupt {
            config.corrupt = corrupt;
        }
        if let Some(count) = self.quorum_count {
            config.quorum_count = count;
        }
        if let Some(size) = self.quorum_size {
            config.quorum_size = size;
        }

        let network: &mut NetworkConfig = &mut config.network;
        match self.seed {
            Some(seed) => network.seed = seed,
            None if !seed_from_file => network.seed = rand::random(),
            None => {}
        }
        if self.parallel {
            network.driver = DriverKind::Parallel {
                threads: self.threads,
            };
        }
        if let Some(round_length) = self.round_length {
            network.model = ExecutionModel::Synchronous { round_length };
        }
        if let Some(max_jitter) = self.jitter {
            network.model = ExecutionModel::Asynchronous { max_jitter };
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,mpcsim_simulator=info")),
        )
        .init();

    let args = Args::parse();
    let network_analysis = args.network_analysis;
    let party_details = args.party_details;
    let config = args.into_config()?;

    info!(
        scenario = %config.scenario,
        seed = config.network.seed,
        driver = ?config.network.driver,
        model = ?config.network.model,
        "Configured"
    );

    let simulator = Simulator::new(config).context("invalid configuration")?;
    let report = simulator.run().context("scenario failed")?;

    report.print_summary();
    if network_analysis {
        report.traffic.print_summary();
    }
    if let Some(top_n) = party_details {
        report.traffic.print_party_details(top_n);
    }

    if !report.is_correct() {
        bail!(
            "{} produced wrong or missing outputs at {:?}",
            report.scenario,
            report.disagreeing()
        );
    }
    Ok(())
}
