//! End-to-end scenario runs through the public simulator API.

use mpcsim_network::{ExecutionModel, NetworkConfig};
use mpcsim_simulation::DriverKind;
use mpcsim_simulator::{Scenario, Simulator, SimulatorConfig, SimulatorError};
use tracing_test::traced_test;

fn config_for(scenario: Scenario, seed: u64) -> SimulatorConfig {
    let base = SimulatorConfig::new(scenario, 8).with_seed(seed);
    match scenario {
        Scenario::QuorumReshare => base.with_quorums(2, 5).with_corrupt(0),
        Scenario::ShareRenewal => base.with_corrupt(0),
        _ => base,
    }
}

#[test]
fn test_every_scenario_on_both_drivers() {
    let drivers = [
        DriverKind::Sequential,
        DriverKind::Parallel { threads: Some(3) },
    ];
    for scenario in Scenario::ALL {
        for driver in drivers {
            let mut config = config_for(scenario, 11);
            config.network.driver = driver;
            let report = Simulator::new(config).unwrap().run().unwrap();
            assert!(
                report.is_correct(),
                "{scenario} on {driver:?}: {:?} != {}",
                report.outputs,
                report.expected
            );
            assert!(report.network.messages_sent > 0);
        }
    }
}

#[test]
fn test_drivers_agree_exactly() {
    for scenario in Scenario::ALL {
        let sequential = Simulator::new(config_for(scenario, 5)).unwrap().run().unwrap();

        let mut config = config_for(scenario, 5);
        config.network.driver = DriverKind::Parallel { threads: Some(4) };
        let parallel = Simulator::new(config).unwrap().run().unwrap();

        assert_eq!(sequential.outputs, parallel.outputs, "{scenario}");
        assert_eq!(sequential.network.messages_sent, parallel.network.messages_sent);
        assert_eq!(sequential.network.bytes_sent, parallel.network.bytes_sent);
        assert_eq!(sequential.network.final_time, parallel.network.final_time);
        assert_eq!(
            sequential.network.events_processed,
            parallel.network.events_processed
        );
    }
}

#[test]
fn test_small_field_secret_sum() {
    // Inputs 26, 27, 28 and 29 = 0 over Z_29.
    let config = SimulatorConfig::new(Scenario::SecretSum, 4)
        .with_prime(29)
        .with_degree(1)
        .with_secret(26)
        .with_corrupt(0)
        .with_seed(42);
    let report = Simulator::new(config).unwrap().run().unwrap();
    assert_eq!(report.expected, (26 + 27 + 28) % 29);
    assert_eq!(report.outputs.len(), 4);
    assert!(report.is_correct());
    assert!(report.disagreeing().is_empty());
    assert!(report.network.all_completed());
}

#[test]
fn test_synchronous_rounds_take_whole_round_lengths() {
    let network = NetworkConfig::default()
        .with_seed(9)
        .with_model(ExecutionModel::Synchronous { round_length: 10 });
    let config = SimulatorConfig::new(Scenario::SecretSum, 5)
        .with_degree(1)
        .with_corrupt(1)
        .with_network(network);
    let report = Simulator::new(config).unwrap().run().unwrap();
    assert!(report.is_correct());
    // Two communication rounds: input shares then sum shares.
    assert_eq!(report.network.final_time, 20);
}

#[test]
fn test_jitter_does_not_change_the_result() {
    let network = NetworkConfig::default()
        .with_seed(4)
        .with_model(ExecutionModel::Asynchronous { max_jitter: 7 });
    let config = SimulatorConfig::new(Scenario::ShareRenewal, 6)
        .with_corrupt(0)
        .with_network(network);
    let report = Simulator::new(config).unwrap().run().unwrap();
    assert!(report.is_correct());
}

#[test]
fn test_invalid_configs_are_rejected() {
    let not_prime = SimulatorConfig::new(Scenario::SecretSum, 4).with_prime(28);
    assert!(matches!(
        Simulator::new(not_prime),
        Err(SimulatorError::InvalidConfig(_))
    ));

    let too_many_errors = SimulatorConfig::new(Scenario::SecretSum, 5)
        .with_degree(2)
        .with_corrupt(2);
    assert!(Simulator::new(too_many_errors).is_err());

    let one_quorum = SimulatorConfig::new(Scenario::QuorumReshare, 8).with_quorums(1, 5);
    assert!(Simulator::new(one_quorum).is_err());
}

#[test]
fn test_toml_config_round_trip() {
    let config: SimulatorConfig = toml::from_str(
        r#"
        scenario = "majority_filter"
        parties = 9
        corrupt = 3

        [network]
        seed = 17
        driver = { kind = "parallel", threads = 2 }
        "#,
    )
    .unwrap();
    assert_eq!(config.scenario, Scenario::MajorityFilter);
    assert_eq!(config.network.seed, 17);
    let report = Simulator::new(config).unwrap().run().unwrap();
    assert!(report.is_correct(), "{:?}", report.outputs);
}

#[traced_test]
#[test]
fn test_run_is_logged() {
    let config = SimulatorConfig::new(Scenario::SecretSum, 5)
        .with_degree(1)
        .with_seed(1);
    Simulator::new(config).unwrap().run().unwrap();
    assert!(logs_contain("Starting scenario"));
    assert!(logs_contain("Scenario complete"));
}
