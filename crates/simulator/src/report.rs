//! Scenario run reports.

use crate::Scenario;
use mpcsim_core::PartyId;
use mpcsim_network::{BandwidthReport, NetworkReport};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything known about one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub seed: u64,
    pub parties: usize,
    pub expected: u64,
    pub outputs: BTreeMap<PartyId, Option<u64>>,
    pub network: NetworkReport,
    #[serde(skip)]
    pub traffic: BandwidthReport,
}

impl ScenarioReport {
    /// Every reporting party produced the expected value.
    pub fn is_correct(&self) -> bool {
        !self.outputs.is_empty() && self.outputs.values().all(|v| *v == Some(self.expected))
    }

    /// Parties whose output is missing or wrong.
    pub fn disagreeing(&self) -> Vec<PartyId> {
        self.outputs
            .iter()
            .filter(|(_, v)| **v != Some(self.expected))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn print_summary(&self) {
        println!();
        println!("====================== SCENARIO RESULT ========================");
        println!("Scenario:               {}", self.scenario);
        println!("Seed:                   {}", self.seed);
        println!("Parties:                {}", self.parties);
        println!("Expected Value:         {}", self.expected);
        println!(
            "Reporting Parties:      {} ({} disagreeing)",
            self.outputs.len(),
            self.disagreeing().len()
        );
        println!(
            "Result:                 {}",
            if self.is_correct() { "CORRECT" } else { "INCORRECT" }
        );
        println!();
        println!("========================== RUN ================================");
        println!("Simulated Time:         {} ticks", self.network.final_time);
        println!("Events Processed:       {}", self.network.events_processed);
        println!("Messages Sent:          {}", self.network.messages_sent);
        println!("Bytes Sent:             {}", self.network.bytes_sent);
        println!(
            "Completed / Incomplete: {} / {}",
            self.network.completed.len(),
            self.network.incomplete.len()
        );
        if self.network.halted {
            println!("Halted with {} events pending", self.network.pending_events);
        }

        if !self.network.diagnostics.is_empty() {
            println!();
            println!("======================= DIAGNOSTICS ===========================");
            for diagnostic in &self.network.diagnostics {
                println!("  {diagnostic}");
            }
        }
        println!("================================================================");
    }
}
