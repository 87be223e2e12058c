//! Scenario runner.

use crate::report::ScenarioReport;
use crate::{scenarios, SimulatorConfig, SimulatorError};
use tracing::{info, warn};

/// Runs one configured scenario.
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    /// Validate `config` and prepare a run.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn run(&self) -> Result<ScenarioReport, SimulatorError> {
        let config = &self.config;
        info!(
            scenario = %config.scenario,
            parties = config.parties,
            prime = config.prime,
            degree = config.degree,
            corrupt = config.corrupt,
            seed = config.network.seed,
            "Starting scenario"
        );

        let outcome = scenarios::run(config)?;
        let report = ScenarioReport {
            scenario: config.scenario,
            seed: config.network.seed,
            parties: config.parties,
            expected: outcome.expected,
            outputs: outcome.outputs,
            network: outcome.network,
            traffic: outcome.traffic,
        };

        if report.is_correct() {
            info!(
                scenario = %config.scenario,
                value = report.expected,
                messages = report.network.messages_sent,
                final_time = report.network.final_time,
                "Scenario complete"
            );
        } else {
            warn!(
                scenario = %config.scenario,
                expected = report.expected,
                disagreeing = ?report.disagreeing(),
                "Scenario produced wrong or missing outputs"
            );
        }
        Ok(report)
    }
}
