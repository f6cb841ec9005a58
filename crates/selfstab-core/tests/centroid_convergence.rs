//! Centroid convergence tests
//!
//! Runs the centroid program to stabilisation from random initial states
//! and checks the elected node against the brute-force centroid.

use selfstab_core::algorithms::centroid::{self, POINTER, WEIGHTS};
use selfstab_core::setup;
use selfstab_core::{Network, NodeId, SimConfig, Value};

const MAX_MOVES: u64 = 10_000;

fn config_with_seed(seed: u64) -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.seed = seed;
    config
}

fn assert_legitimate(network: &Network) {
    assert!(network.is_symmetric());
    for id in network.ids() {
        assert!(centroid::is_consistent(network, id), "node {} inconsistent", id);
    }
    let elected = centroid::elected_centroid(network);
    assert!(elected.is_some(), "pointers do not agree");
    assert_eq!(elected, centroid::weighted_centroid(network));
}

#[test]
fn test_fixture_converges_to_node_5() {
    for seed in [0, 1, 7, 42, 1234, 99_999] {
        let mut network = setup::centroid_fixture(&config_with_seed(seed)).unwrap();
        let moves = network.run_until_stable(MAX_MOVES).unwrap();

        assert!(moves > 0, "seed {} started stable", seed);
        assert!(network.is_stabilised());
        assert_legitimate(&network);
        assert_eq!(centroid::elected_centroid(&network), Some(NodeId(5)));
    }
}

#[test]
fn test_fixture_pointer_paths() {
    let mut network = setup::centroid_fixture(&config_with_seed(3)).unwrap();
    network.run_until_stable(MAX_MOVES).unwrap();

    let expected = [(1, 2), (2, 4), (3, 2), (4, 5), (5, 5), (6, 5), (7, 5)];
    for (id, p) in expected {
        let pointer = network.view(NodeId(id)).unwrap().id_var(POINTER);
        assert_eq!(pointer, Some(NodeId(p)), "pointer of node {}", id);
    }
}

#[test]
fn test_fixture_weight_tables() {
    let mut network = setup::centroid_fixture(&config_with_seed(11)).unwrap();
    network.run_until_stable(MAX_MOVES).unwrap();

    // Weight of 5's own side of each of its edges
    let view = network.view(NodeId(5)).unwrap();
    assert_eq!(view.table_float(WEIGHTS, NodeId(4)), Some(15.0));
    assert_eq!(view.table_float(WEIGHTS, NodeId(6)), Some(29.0));
    assert_eq!(view.table_float(WEIGHTS, NodeId(7)), Some(20.0));
}

#[test]
fn test_random_weighted_trees_converge() {
    for seed in 0..8 {
        for n in [1, 2, 5, 12] {
            let config = config_with_seed(seed);
            let mut network = setup::random_weighted_tree(&config, n).unwrap();
            assert_eq!(network.len(), n as usize);

            network
                .run_until_stable(MAX_MOVES * 5)
                .unwrap_or_else(|e| panic!("seed {} n {}: {}", seed, n, e));
            if n == 1 {
                // A lone node keeps whatever pointer it was given
                continue;
            }
            assert_legitimate(&network);
        }
    }
}

#[test]
fn test_recovers_from_transient_fault() {
    let mut network = setup::centroid_fixture(&config_with_seed(5)).unwrap();
    network.run_until_stable(MAX_MOVES).unwrap();
    let steps = network.steps();

    let corrupt = Value::Table([(NodeId(4), Value::Float(100.0))].into());
    network.set_variable(NodeId(5), WEIGHTS, corrupt).unwrap();
    network.set_variable(NodeId(1), POINTER, NodeId(1)).unwrap();
    assert!(!network.is_stabilised());

    let repair = network.run_until_stable(MAX_MOVES).unwrap();
    assert!(repair > 0);
    assert_eq!(network.steps(), steps + repair);
    assert_legitimate(&network);
    assert_eq!(centroid::elected_centroid(&network), Some(NodeId(5)));
}

#[test]
fn test_every_move_is_recorded_with_its_diff() {
    let mut network = setup::centroid_fixture(&config_with_seed(21)).unwrap();
    let records: Vec<_> = network
        .run()
        .take(MAX_MOVES as usize)
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(network.is_stabilised());

    for record in &records {
        let changes = record.changes();
        assert!(!changes.is_empty(), "move {} changed nothing", record.step);
        let variable = if record.rule == "rule_1" { WEIGHTS } else { POINTER };
        assert!(changes.iter().all(|c| c.variable() == Some(variable)));
        if record.rule == "rule_1" {
            assert_eq!(changes.len(), 1);
        }
    }
}
