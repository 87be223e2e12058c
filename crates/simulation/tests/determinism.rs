//! Tests for event ordering and determinism.
//!
//! These tests verify that both drivers honour the queue order
//! `(time, insertion)`, keep per-target FIFO, and produce identical results
//! from the same schedule, which is the core property we need for debugging
//! and replay.

use mpcsim_simulation::{
    Delay, DriverKind, Entity, EntityId, ParallelDriver, Scheduler, SequentialDriver, SimTime,
    Simulation, SimulationError,
};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing_test::traced_test;

#[derive(Debug, Error)]
#[error("node {0} refused the event")]
struct Refused(EntityId);

type GlobalLog = Arc<Mutex<Vec<(SimTime, &'static str)>>>;

/// Records what it handled, locally and in a shared log.
struct Node {
    id: EntityId,
    seen: Vec<(SimTime, &'static str)>,
    global: GlobalLog,
}

impl Entity for Node {
    type Error = Refused;
}

impl Node {
    fn record(&mut self, now: SimTime, label: &'static str) {
        self.seen.push((now, label));
        self.global.lock().push((now, label));
    }
}

fn build(n: u32) -> (Simulation<Node>, GlobalLog) {
    let global: GlobalLog = Arc::default();
    let mut sim = Simulation::new();
    for id in 0..n {
        sim.add_entity(Node {
            id,
            seen: Vec::new(),
            global: global.clone(),
        });
    }
    (sim, global)
}

type Step = dyn FnOnce(&mut Node, &Scheduler<Node>) -> Result<(), Refused> + Send;

fn mark(label: &'static str) -> Box<Step> {
    Box::new(move |node: &mut Node, s: &Scheduler<Node>| {
        node.record(s.now(), label);
        Ok(())
    })
}

/// E1 and E2 fire at t=5 on different targets, E3 at t=3. E1 schedules E4
/// one tick later.
fn schedule_three_events(sim: &Simulation<Node>) {
    sim.schedule(0, Delay::ticks(5), |node: &mut Node, s| {
        node.record(s.now(), "E1");
        s.schedule(1, Delay::ticks(1), mark("E4"));
        Ok(())
    });
    sim.schedule(1, Delay::ticks(5), mark("E2"));
    sim.schedule(0, Delay::ticks(3), mark("E3"));
}

#[test]
fn test_event_ordering_sequential() {
    let (mut sim, global) = build(2);
    schedule_three_events(&sim);

    let stats = sim.run(&SequentialDriver).unwrap();
    assert_eq!(stats.events_processed, 4);
    assert_eq!(stats.final_time, 6);
    assert_eq!(
        *global.lock(),
        vec![(3, "E3"), (5, "E1"), (5, "E2"), (6, "E4")]
    );
}

#[traced_test]
#[test]
fn test_event_ordering_parallel() {
    let (mut sim, global) = build(2);
    schedule_three_events(&sim);

    let stats = sim.run(&ParallelDriver::new()).unwrap().clone();
    assert_eq!(stats.events_processed, 4);
    assert_eq!(stats.batches, 3);
    assert_eq!(stats.widest_batch, 2);

    // E3 strictly first, E1/E2 in either order, E4 only after the barrier.
    let log = global.lock().clone();
    assert_eq!(log[0], (3, "E3"));
    let mut middle = vec![log[1], log[2]];
    middle.sort();
    assert_eq!(middle, vec![(5, "E1"), (5, "E2")]);
    assert_eq!(log[3], (6, "E4"));

    assert_eq!(sim.entity(0).unwrap().seen, vec![(3, "E3"), (5, "E1")]);
    assert_eq!(sim.entity(1).unwrap().seen, vec![(5, "E2"), (6, "E4")]);
}

#[test]
fn test_zero_delay_runs_after_queued_events_of_same_instant() {
    for driver in [DriverKind::Sequential, DriverKind::Parallel { threads: Some(2) }] {
        let (mut sim, _) = build(2);
        sim.schedule(0, Delay::ticks(1), |node: &mut Node, s| {
            node.record(s.now(), "first");
            s.schedule(0, Delay::ZERO, mark("follow-up"));
            Ok(())
        });
        sim.schedule(0, Delay::ticks(1), mark("second"));

        sim.run(&driver.build().unwrap()).unwrap();
        assert_eq!(
            sim.entity(0).unwrap().seen,
            vec![(1, "first"), (1, "second"), (1, "follow-up")],
            "{driver:?}"
        );
    }
}

/// Each hop forwards to a pseudo-random peer with a pseudo-random delay.
fn gossip(hops: u32, state: u64) -> Box<Step> {
    Box::new(move |node: &mut Node, s: &Scheduler<Node>| {
        node.record(s.now(), "hop");
        if hops == 0 {
            return Ok(());
        }
        for fanout in 0..2u64 {
            let next = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407 + fanout + node.id as u64);
            let target = ((next >> 33) % 8) as EntityId;
            let delay = Delay::ticks((next >> 13) % 3);
            s.schedule(target, delay, gossip(hops - 1, next));
        }
        Ok(())
    })
}

#[test]
fn test_drivers_agree_on_same_schedule() {
    let run = |kind: DriverKind| {
        let (mut sim, _) = build(8);
        for id in 0..8 {
            sim.schedule(id, Delay::ticks(u64::from(id % 2)), gossip(6, u64::from(id) + 1));
        }
        let stats = sim.run(&kind.build().unwrap()).unwrap().clone();
        let logs: Vec<_> = sim.into_entities().into_iter().map(|n| n.seen).collect();
        (stats.events_processed, stats.final_time, logs)
    };

    let sequential = run(DriverKind::Sequential);
    assert_eq!(sequential, run(DriverKind::Sequential));
    assert_eq!(sequential, run(DriverKind::Parallel { threads: None }));
    assert_eq!(sequential, run(DriverKind::Parallel { threads: Some(3) }));
}

#[test]
fn test_halt_leaves_events_queued() {
    for driver in [DriverKind::Sequential, DriverKind::Parallel { threads: None }] {
        let (mut sim, _) = build(2);
        sim.schedule(0, Delay::ticks(2), |node: &mut Node, s| {
            node.record(s.now(), "halt");
            s.halt();
            Ok(())
        });
        sim.schedule(1, Delay::ticks(5), mark("later"));

        let driver = driver.build().unwrap();
        let stats = sim.run(&driver).unwrap();
        assert!(stats.halted);
        assert_eq!(stats.final_time, 2);
        assert_eq!(sim.pending(), 1);

        // A second run resumes where the first stopped.
        let stats = sim.run(&driver).unwrap();
        assert!(!stats.halted);
        assert_eq!(stats.events_processed, 2);
        assert_eq!(sim.entity(1).unwrap().seen, vec![(5, "later")]);
    }
}

#[test]
fn test_run_until_deadline() {
    let (mut sim, _) = build(1);
    sim.schedule(0, Delay::ticks(3), mark("early"));
    sim.schedule(0, Delay::ticks(10), mark("late"));

    let stats = sim.run_until(&SequentialDriver, 5).unwrap();
    assert_eq!(stats.events_processed, 1);
    assert_eq!(sim.pending(), 1);
    assert_eq!(sim.now(), 3);
}

#[test]
fn test_handler_error_aborts_run() {
    for driver in [DriverKind::Sequential, DriverKind::Parallel { threads: None }] {
        let (mut sim, _) = build(2);
        sim.schedule(1, Delay::ticks(4), |node: &mut Node, _| Err(Refused(node.id)));
        sim.schedule(0, Delay::ticks(9), mark("never"));

        let err = sim.run(&driver.build().unwrap()).unwrap_err();
        match err {
            SimulationError::Handler { target, time, source } => {
                assert_eq!((target, time), (1, 4));
                assert_eq!(source.to_string(), "node 1 refused the event");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sim.entity(0).unwrap().seen.is_empty());
    }
}

#[test]
fn test_unknown_target_is_fatal() {
    for driver in [DriverKind::Sequential, DriverKind::Parallel { threads: None }] {
        let (mut sim, _) = build(1);
        sim.schedule(7, Delay::ticks(1), mark("lost"));
        assert!(matches!(
            sim.run(&driver.build().unwrap()),
            Err(SimulationError::UnknownTarget { target: 7, time: 1 })
        ));
    }
}
