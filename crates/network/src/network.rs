//! The simulated network: parties, their sessions and the run loop.

use crate::party::{Party, Shared};
use crate::protocol::Protocol;
use crate::session::Session;
use crate::{BandwidthReport, Diagnostic, NetworkConfig, NetworkError, TrafficAnalyzer};
use mpcsim_core::{GroupId, PartyId, Quorum};
use mpcsim_simulation::{Delay, EntityId, Simulation, SimTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of [`Network::run`].
#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub final_time: SimTime,
    pub events_processed: u64,
    /// Events still queued; non-zero after a halt or a deadline.
    pub pending_events: usize,
    pub halted: bool,
    pub completed: Vec<PartyId>,
    /// Parties expected to produce output that did not.
    pub incomplete: Vec<PartyId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl NetworkReport {
    pub fn all_completed(&self) -> bool {
        self.incomplete.is_empty()
    }
}

/// A set of parties running `P` over a simulated network.
pub struct Network<P: Protocol> {
    config: NetworkConfig,
    simulation: Simulation<Party<P>>,
    directory: BTreeMap<PartyId, EntityId>,
    traffic: Arc<TrafficAnalyzer>,
    /// Set by the first run; parties are fixed from then on.
    shared: Option<Arc<Shared>>,
}

impl<P: Protocol> Network<P> {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            simulation: Simulation::new(),
            directory: BTreeMap::new(),
            traffic: Arc::new(TrafficAnalyzer::new()),
            shared: None,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Register a party whose broadcasts reach every registered party.
    pub fn add_party(&mut self, id: PartyId, protocol: P) -> Result<(), NetworkError> {
        self.add_party_in(id, protocol, Vec::new())
    }

    /// Register a party that also knows `quorums` for quorum addressing.
    pub fn add_party_in(
        &mut self,
        id: PartyId,
        protocol: P,
        quorums: Vec<Quorum>,
    ) -> Result<(), NetworkError> {
        if self.shared.is_some() {
            return Err(NetworkError::AlreadyStarted(id));
        }
        if self.directory.contains_key(&id) {
            return Err(NetworkError::DuplicateParty(id));
        }
        let session = Session::new(protocol, GroupId::ROOT, Vec::new(), quorums);
        let entity = self
            .simulation
            .add_entity(Party::new(id, session, self.config.seed));
        self.directory.insert(id, entity);
        Ok(())
    }

    pub fn party_ids(&self) -> impl Iterator<Item = PartyId> + '_ {
        self.directory.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    pub fn party(&self, id: PartyId) -> Option<&Party<P>> {
        let entity = *self.directory.get(&id)?;
        self.simulation.entity(entity)
    }

    pub fn output(&self, id: PartyId) -> Option<&P::Output> {
        self.party(id)?.session().output()
    }

    /// Outputs of every party that completed, by party.
    pub fn outputs(&self) -> BTreeMap<PartyId, P::Output> {
        self.parties()
            .filter_map(|party| party.session().output().map(|o| (party.id(), o.clone())))
            .collect()
    }

    pub fn now(&self) -> SimTime {
        self.simulation.now()
    }

    pub fn traffic(&self) -> &TrafficAnalyzer {
        &self.traffic
    }

    pub fn traffic_report(&self) -> BandwidthReport {
        self.traffic.generate_report(self.now(), self.len())
    }

    fn parties(&self) -> impl Iterator<Item = &Party<P>> + '_ {
        self.directory
            .values()
            .filter_map(|&entity| self.simulation.entity(entity))
    }

    /// Start every party at time zero (first run only) and run until the
    /// queue drains, a handler halts, or the configured deadline passes.
    ///
    /// Calling `run` again after a halt or a deadline resumes where the
    /// previous run stopped.
    pub fn run(&mut self) -> Result<NetworkReport, NetworkError> {
        if self.shared.is_none() {
            self.start_parties();
        }
        let driver = self.config.driver.build()?;
        info!(
            parties = self.len(),
            driver = ?self.config.driver,
            model = ?self.config.model,
            seed = self.config.seed,
            "Running network"
        );
        let stats = match self.config.deadline {
            Some(deadline) => self.simulation.run_until(&driver, deadline)?,
            None => self.simulation.run(&driver)?,
        }
        .clone();

        let report = self.report(stats.events_processed, stats.halted);
        if !report.incomplete.is_empty() {
            warn!(
                incomplete = report.incomplete.len(),
                diagnostics = report.diagnostics.len(),
                "Run ended with incomplete parties"
            );
        }
        info!(
            messages = report.messages_sent,
            bytes = report.bytes_sent,
            final_time = report.final_time,
            completed = report.completed.len(),
            "Network run finished"
        );
        Ok(report)
    }

    fn start_parties(&mut self) {
        let peers: Vec<PartyId> = self.directory.keys().copied().collect();
        for entity in self.directory.values() {
            if let Some(party) = self.simulation.entity_mut(*entity) {
                party.session_mut().set_peers(peers.clone());
            }
        }
        let shared = Arc::new(Shared {
            directory: self.directory.clone(),
            traffic: Arc::clone(&self.traffic),
            config: self.config.clone(),
        });
        for &entity in self.directory.values() {
            let shared = Arc::clone(&shared);
            self.simulation
                .schedule(entity, Delay::ZERO, move |party: &mut Party<P>, scheduler| {
                    party.start(scheduler, &shared)
                });
        }
        self.shared = Some(shared);
    }

    fn report(&self, events_processed: u64, halted: bool) -> NetworkReport {
        let (messages_sent, bytes_sent) = self.traffic.totals();
        let mut completed = Vec::new();
        let mut incomplete = Vec::new();
        let mut diagnostics = Vec::new();
        for party in self.parties() {
            let session = party.session();
            if session.is_completed() {
                completed.push(party.id());
            } else if session.produces_output() {
                incomplete.push(party.id());
            }
            diagnostics.extend(session.diagnostics(party.id()));
        }
        NetworkReport {
            messages_sent,
            bytes_sent,
            final_time: self.now(),
            events_processed,
            pending_events: self.simulation.pending(),
            halted,
            completed,
            incomplete,
            diagnostics,
        }
    }
}
