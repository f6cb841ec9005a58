//! Topology Builders
//!
//! Assemble networks for runs and tests. Every node is drawn from the
//! network's own generator, so a topology is reproducible from the seed.

use rand::rngs::SmallRng;
use rand::Rng;
use selfstab_events::NodeId;
use std::sync::Arc;

use crate::algorithms::centroid;
use crate::components::{Node, Program};
use crate::config::SimConfig;
use crate::error::EngineError;
use crate::systems::Network;

/// Own weights of fixture nodes 1 to 7.
pub const FIXTURE_WEIGHTS: [f64; 7] = [5.0, 3.0, 2.0, 5.0, 4.0, 1.0, 10.0];

/// Fixture tree edges as (parent, child). Node 2 is the hub.
pub const FIXTURE_EDGES: [(u64, u64); 6] = [(1, 2), (2, 3), (2, 4), (4, 5), (5, 6), (5, 7)];

/// Builds a tree from `(parent, child)` edges in order. The first parent
/// becomes the root; each child is created by `make` and attached to its
/// parent. An edge between two existing nodes is simply connected.
pub fn build_tree(
    network: &mut Network,
    edges: &[(u64, u64)],
    mut make: impl FnMut(NodeId, &mut SmallRng) -> Result<Node, EngineError>,
) -> Result<(), EngineError> {
    let Some(&(root, _)) = edges.first() else {
        return Ok(());
    };
    let root = NodeId(root);
    if !network.contains(root) {
        let node = make(root, network.rng_mut())?;
        network.insert(node)?;
    }

    for &(parent, child) in edges {
        let (parent, child) = (NodeId(parent), NodeId(child));
        if network.contains(child) {
            network.connect(parent, child)?;
        } else {
            let node = make(child, network.rng_mut())?;
            network.attach(parent, node)?;
        }
    }
    Ok(())
}

/// The seven-node weighted tree with weights [5, 3, 2, 5, 4, 1, 10].
///
/// Its weighted centroid is node 5: nodes 4 and 5 split the total weight
/// of 30 evenly and the tie goes to the larger id.
pub fn centroid_fixture(config: &SimConfig) -> Result<Network, EngineError> {
    let program = Arc::new(centroid::program(&config.centroid)?);
    let mut network = Network::new(config.simulation.seed);
    build_tree(&mut network, &FIXTURE_EDGES, |id, rng| {
        let weight = FIXTURE_WEIGHTS[(id.raw() - 1) as usize];
        centroid::node(&program, id, weight, rng)
    })?;
    Ok(network)
}

/// Random tree edges over ids `1..=n`: node `i` picks a uniformly random
/// parent among `1..i`.
pub fn random_edges(n: u64, rng: &mut SmallRng) -> Vec<(u64, u64)> {
    (2..=n).map(|child| (rng.gen_range(1..child), child)).collect()
}

/// Fills `network` with a random tree of `n` nodes running `program`.
pub fn random_tree(
    network: &mut Network,
    program: &Arc<Program>,
    n: u64,
) -> Result<(), EngineError> {
    if n == 1 {
        let node = Node::new(Arc::clone(program), NodeId(1), network.rng_mut());
        network.insert(node)?;
        return Ok(());
    }
    let edges = random_edges(n, network.rng_mut());
    build_tree(network, &edges, |id, rng| Ok(Node::new(Arc::clone(program), id, rng)))
}

/// Random tree of `n` centroid nodes with integer weights in
/// `1..=max_weight`.
pub fn random_weighted_tree(config: &SimConfig, n: u64) -> Result<Network, EngineError> {
    let program = Arc::new(centroid::program(&config.centroid)?);
    let max_weight = config.centroid.max_weight.max(1);
    let mut network = Network::new(config.simulation.seed);
    if n == 1 {
        let node = centroid::node(&program, NodeId(1), 1.0, network.rng_mut())?;
        network.insert(node)?;
        return Ok(network);
    }
    let edges = random_edges(n, network.rng_mut());
    build_tree(&mut network, &edges, |id, rng| {
        let weight = rng.gen_range(1..=max_weight) as f64;
        centroid::node(&program, id, weight, rng)
    })?;
    Ok(network)
}
