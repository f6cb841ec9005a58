//! Weighted Centroid Election
//!
//! Self-stabilizing algorithm for finding the weighted centroid of a tree,
//! after H. Bielak and M. Panczyk, "A self-stabilizing algorithm for finding
//! weighted centroid in trees" (DOI 10.2478/v10065-012-0035-x).
//!
//! Variables per node:
//! - `W`: for each neighbour `j`, this node's estimate of the weight of the
//!   subtree hanging off the edge towards it, seen from `j`'s side
//! - `w`: the node's own weight
//! - `p`: the node's pointer towards the centroid
//!
//! `W[j]` is consistent when it equals `w` plus every other neighbour's
//! report `k.W[self]`. Rule 1 repairs one inconsistent entry per move;
//! rules 2 to 5 move the pointer once the node is consistent.

use rand::rngs::SmallRng;
use selfstab_events::{NodeId, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::components::{Assignment, Node, NodeView, Program};
use crate::config::CentroidConfig;
use crate::error::{DefinitionError, EngineError};
use crate::random::RandomValue;
use crate::systems::Network;

pub const PROGRAM_NAME: &str = "centroid";

/// Per-neighbour subtree weight table
pub const WEIGHTS: &str = "W";
/// Own weight
pub const WEIGHT: &str = "w";
/// Centroid pointer
pub const POINTER: &str = "p";

/// Declares the five-rule centroid program.
pub fn program(config: &CentroidConfig) -> Result<Program, DefinitionError> {
    Program::builder(PROGRAM_NAME)
        .table(WEIGHTS, RandomValue::float(config.table_scale))
        .scalar(WEIGHT, RandomValue::float(config.weight_scale))
        .scalar(POINTER, RandomValue::id_up_to(config.pointer_upper_bound))
        .rule("rule_1", rule_1)
        .rule("rule_2", rule_2)
        .rule("rule_3", rule_3)
        .rule("rule_4", rule_4)
        .rule("rule_5", rule_5)
        .build()
}

/// Builds a centroid node with a fixed own weight.
pub fn node(
    program: &Arc<Program>,
    id: NodeId,
    weight: f64,
    rng: &mut SmallRng,
) -> Result<Node, EngineError> {
    Node::new(Arc::clone(program), id, rng).with_value(WEIGHT, weight)
}

/// What neighbour `j` reports as the weight of the subtree containing `of`.
fn reported(j: &NodeView<'_>, of: NodeId) -> f64 {
    // Entries are seeded on connect
    j.table_float(WEIGHTS, of).unwrap_or(0.0)
}

/// Finds the first neighbour whose `W` entry breaks the consistency
/// invariant, together with the value it should hold.
pub fn w_correct(node: &NodeView<'_>) -> Option<(NodeId, f64)> {
    let own = node.float(WEIGHT).unwrap_or(0.0);
    let reports: Vec<(NodeId, f64)> = node
        .neighbours()
        .map(|k| (k.id(), reported(&k, node.id())))
        .collect();

    for (j, _) in &reports {
        let weight = own
            + reports
                .iter()
                .filter(|(k, _)| k != j)
                .map(|(_, w)| w)
                .sum::<f64>();
        if node.table_float(WEIGHTS, *j) != Some(weight) {
            return Some((*j, weight));
        }
    }
    None
}

/// Half the tree weight as seen through one randomly chosen edge.
///
/// Only defined for a consistent node with at least one neighbour.
fn half_tree_weight(node: &NodeView<'_>, rng: &mut SmallRng) -> Option<f64> {
    if w_correct(node).is_some() {
        return None;
    }
    let neighbour = node.random_neighbour(rng)?;
    let through = node.table_float(WEIGHTS, neighbour.id()).unwrap_or(0.0);
    Some((through + reported(&neighbour, node.id())) / 2.0)
}

fn point_to(target: NodeId) -> Assignment {
    Assignment::new().set(POINTER, target)
}

/// Repair: fix one inconsistent `W` entry.
fn rule_1(node: &NodeView<'_>, _rng: &mut SmallRng) -> Option<Assignment> {
    let (j, weight) = w_correct(node)?;
    let mut table: BTreeMap<NodeId, Value> = node.table(WEIGHTS).cloned().unwrap_or_default();
    table.insert(j, Value::Float(weight));
    Some(Assignment::new().set(WEIGHTS, Value::Table(table)))
}

/// Every neighbour reports less than half: this node is the centroid.
fn rule_2(node: &NodeView<'_>, rng: &mut SmallRng) -> Option<Assignment> {
    let half = half_tree_weight(node, rng)?;
    let me = node.id();
    let all_lighter = node.neighbours().all(|j| reported(&j, me) < half);
    (all_lighter && node.id_var(POINTER) != Some(me)).then(|| point_to(me))
}

/// Some neighbour reports more than half: the centroid lies beyond it.
fn rule_3(node: &NodeView<'_>, rng: &mut SmallRng) -> Option<Assignment> {
    let half = half_tree_weight(node, rng)?;
    let me = node.id();
    let pointer = node.id_var(POINTER);
    node.neighbours()
        .filter(|j| reported(j, me) > half)
        .find(|j| pointer != Some(j.id()))
        .map(|j| point_to(j.id()))
}

/// Exact split with a smaller neighbour: claim the centroid.
fn rule_4(node: &NodeView<'_>, rng: &mut SmallRng) -> Option<Assignment> {
    let half = half_tree_weight(node, rng)?;
    let me = node.id();
    let tie_with_smaller = node
        .neighbours()
        .any(|j| reported(&j, me) == half && me > j.id());
    (tie_with_smaller && node.id_var(POINTER) != Some(me)).then(|| point_to(me))
}

/// Exact split with a larger neighbour: defer to it.
fn rule_5(node: &NodeView<'_>, rng: &mut SmallRng) -> Option<Assignment> {
    let half = half_tree_weight(node, rng)?;
    let me = node.id();
    let pointer = node.id_var(POINTER);
    node.neighbours()
        .filter(|j| reported(j, me) == half && me < j.id())
        .find(|j| pointer != Some(j.id()))
        .map(|j| point_to(j.id()))
}

/// True if every `W` entry of the node satisfies the invariant.
pub fn is_consistent(network: &Network, id: NodeId) -> bool {
    network
        .view(id)
        .is_some_and(|view| w_correct(&view).is_none())
}

/// The node every pointer path ends at, if the pointers agree.
///
/// Each pointer must name the node itself or one of its neighbours, and
/// following pointers from any node must reach the same self-pointing node.
pub fn elected_centroid(network: &Network) -> Option<NodeId> {
    let mut elected = None;
    for start in network.ids() {
        let mut current = start;
        let mut hops = 0;
        let terminal = loop {
            let node = network.node(current)?;
            let next = node.get(POINTER)?.as_id()?;
            if next == current {
                break current;
            }
            if !node.is_neighbour(next) || hops > network.len() {
                return None;
            }
            current = next;
            hops += 1;
        };
        match elected {
            None => elected = Some(terminal),
            Some(previous) if previous != terminal => return None,
            Some(_) => {}
        }
    }
    elected
}

/// Reference centroid computed directly from the tree and the `w` values:
/// the node whose heaviest branch is lightest, ties going to the larger id.
///
/// `None` for an empty network or one that is not a tree.
pub fn weighted_centroid(network: &Network) -> Option<NodeId> {
    let degrees: usize = network.nodes().map(|node| node.neighbours().len()).sum();
    if network.is_empty() || degrees != 2 * (network.len() - 1) {
        return None;
    }

    let mut best: Option<(NodeId, f64)> = None;
    for center in network.ids() {
        let mut heaviest: f64 = 0.0;
        for branch in network.neighbours(center).ok()? {
            heaviest = heaviest.max(branch_weight(network, center, branch)?);
        }
        match best {
            Some((_, weight)) if heaviest > weight => {}
            _ => best = Some((center, heaviest)),
        }
    }
    best.map(|(id, _)| id)
}

/// Total `w` of the component containing `start` once `cut` is removed.
/// `None` if the walk meets a node twice, i.e. the graph has a cycle.
fn branch_weight(network: &Network, cut: NodeId, start: NodeId) -> Option<f64> {
    let mut total = 0.0;
    let mut visited = BTreeSet::from([cut]);
    let mut stack = vec![(start, cut)];
    while let Some((id, from)) = stack.pop() {
        if !visited.insert(id) {
            return None;
        }
        let node = network.node(id)?;
        total += node.get(WEIGHT).and_then(Value::as_float).unwrap_or(0.0);
        stack.extend(
            node.neighbours()
                .iter()
                .filter(|n| **n != from)
                .map(|n| (*n, id)),
        );
    }
    Some(total)
}
