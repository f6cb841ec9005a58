//! Central Daemon
//!
//! The scheduler of the simulated system. Each move picks one enabled node
//! uniformly at random, lets that node pick one of its own enabled rules
//! uniformly at random, and applies the rule's assignment. The two draws
//! are independent: this is a random fair daemon.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use selfstab_events::{MoveRecord, NodeId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::network::Network;
use crate::components::{Node, NodeView};
use crate::error::EngineError;

impl Network {
    /// Names of the rules currently enabled at `id`.
    pub fn active_rule_names(&mut self, id: NodeId) -> Result<Vec<&'static str>, EngineError> {
        let Network { nodes, rng, .. } = self;
        let node = nodes.get(&id).ok_or(EngineError::UnknownNode(id))?;
        Ok(NodeView::new(node, nodes).active_rule_names(rng))
    }

    /// True if at least one rule is enabled at `id`.
    pub fn is_active(&mut self, id: NodeId) -> Result<bool, EngineError> {
        let Network { nodes, rng, .. } = self;
        let node = nodes.get(&id).ok_or(EngineError::UnknownNode(id))?;
        Ok(NodeView::new(node, nodes).is_active(rng))
    }

    /// Ids of every active node, in ascending order. Recomputed on every
    /// call since any move can change a neighbour's activation.
    ///
    /// Takes `&mut self` because guards may draw from the network's
    /// generator. Use [`Network::active_nodes_with`] from a shared borrow.
    pub fn active_nodes(&mut self) -> Vec<NodeId> {
        let Network { nodes, rng, .. } = self;
        active_in(nodes, rng)
    }

    /// True once no node has an enabled rule. Needs `&mut self` like
    /// [`Network::active_nodes`]; see [`Network::is_stabilised_with`].
    pub fn is_stabilised(&mut self) -> bool {
        self.active_nodes().is_empty()
    }

    /// Like [`Network::active_nodes`], drawing from `rng` instead of the
    /// network's generator, so the run's random sequence is left untouched.
    pub fn active_nodes_with(&self, rng: &mut SmallRng) -> Vec<NodeId> {
        active_in(&self.nodes, rng)
    }

    /// Read-only stabilisation check with a caller-owned generator.
    pub fn is_stabilised_with(&self, rng: &mut SmallRng) -> bool {
        self.nodes
            .values()
            .all(|node| !NodeView::new(node, &self.nodes).is_active(rng))
    }

    /// Node-level move: picks one enabled rule of `id` uniformly at random,
    /// re-evaluates it and applies its assignment. Returns the rule name.
    pub fn move_node(&mut self, id: NodeId) -> Result<&'static str, EngineError> {
        let Network { nodes, rng, .. } = self;
        let node = nodes.get(&id).ok_or(EngineError::UnknownNode(id))?;
        let program = Arc::clone(node.program());
        let view = NodeView::new(node, nodes);

        let active = view.active_rule_names(rng);
        let name = *active.choose(rng).ok_or(EngineError::NoActiveRule(id))?;
        trace!(node = %id, ?active, chosen = name, "rule selected");

        let assignment = program
            .rule(name)
            .and_then(|rule| rule.evaluate(&view, rng))
            .ok_or(EngineError::RuleWithdrawn { node: id, rule: name })?;

        nodes
            .get_mut(&id)
            .ok_or(EngineError::UnknownNode(id))?
            .apply(&assignment)?;
        Ok(name)
    }

    /// One central-daemon step.
    ///
    /// Fails with [`EngineError::NoActiveNode`] on a stabilised network.
    pub fn make_move(&mut self) -> Result<MoveRecord, EngineError> {
        let active = self.active_nodes();
        let id = *active.choose(&mut self.rng).ok_or(EngineError::NoActiveNode)?;

        let prestate = self.state(id)?;
        let rule = self.move_node(id)?;
        let poststate = self.state(id)?;

        self.steps += 1;
        debug!(step = self.steps, node = %id, rule, active = active.len(), "move");
        Ok(MoveRecord::new(self.steps, rule, id, prestate, poststate))
    }

    /// Lazy sequence of moves that ends when the network stabilises.
    ///
    /// May never end if the program does not stabilise; bound it with
    /// `take` or use [`Network::run_until_stable`].
    pub fn run(&mut self) -> Moves<'_> {
        Moves {
            network: self,
            done: false,
        }
    }

    /// Moves until stabilised, failing after `max_moves` moves.
    /// Returns the number of moves made.
    pub fn run_until_stable(&mut self, max_moves: u64) -> Result<u64, EngineError> {
        let mut moves = 0;
        while !self.is_stabilised() {
            if moves >= max_moves {
                return Err(EngineError::MoveBoundExceeded(max_moves));
            }
            self.make_move()?;
            moves += 1;
        }
        Ok(moves)
    }
}

fn active_in(nodes: &BTreeMap<NodeId, Node>, rng: &mut SmallRng) -> Vec<NodeId> {
    nodes
        .values()
        .filter(|node| NodeView::new(node, nodes).is_active(rng))
        .map(|node| node.id())
        .collect()
}

/// Iterator returned by [`Network::run`]. Stops after the first error.
#[derive(Debug)]
pub struct Moves<'a> {
    network: &'a mut Network,
    done: bool,
}

impl Iterator for Moves<'_> {
    type Item = Result<MoveRecord, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.network.is_stabilised() {
            self.done = true;
            return None;
        }
        let result = self.network.make_move();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for Moves<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Assignment, Program};
    use crate::random::RandomValue;
    use rand::SeedableRng;
    use selfstab_events::Value;

    /// Each node copies the larger of its own and its neighbours' values.
    fn max_program() -> Arc<Program> {
        Arc::new(
            Program::builder("max")
                .scalar("x", RandomValue::int_up_to(100))
                .rule("raise", |node, _rng| {
                    let own = node.int("x")?;
                    let best = node.neighbours().filter_map(|n| n.int("x")).max()?;
                    (best > own).then(|| Assignment::new().set("x", best))
                })
                .build()
                .unwrap(),
        )
    }

    fn path(len: u64, seed: u64) -> Network {
        let program = max_program();
        let mut network = Network::new(seed);
        for i in 1..=len {
            let node = Node::new(Arc::clone(&program), NodeId(i), network.rng_mut());
            if i == 1 {
                network.insert(node).unwrap();
            } else {
                network.attach(NodeId(i - 1), node).unwrap();
            }
        }
        network
    }

    #[test]
    fn test_activation_matches_rule_names() {
        let mut network = path(5, 3);
        let ids: Vec<NodeId> = network.ids().collect();
        for id in ids {
            let active = network.is_active(id).unwrap();
            let names = network.active_rule_names(id).unwrap();
            assert_eq!(active, !names.is_empty());
        }
    }

    #[test]
    fn test_move_on_stabilised_network_fails() {
        let mut network = path(4, 1);
        network.run_until_stable(1_000).unwrap();

        assert!(network.is_stabilised());
        assert_eq!(network.make_move(), Err(EngineError::NoActiveNode));
    }

    #[test]
    fn test_stabilisation_is_a_fixed_point() {
        let mut network = path(6, 8);
        network.run_until_stable(1_000).unwrap();
        let states = network.states();

        for _ in 0..5 {
            assert!(network.active_nodes().is_empty());
        }
        assert_eq!(network.states(), states);
    }

    #[test]
    fn test_move_node_requires_active_rule() {
        let mut network = path(3, 2);
        network.run_until_stable(1_000).unwrap();
        assert_eq!(
            network.move_node(NodeId(1)),
            Err(EngineError::NoActiveRule(NodeId(1)))
        );
        assert_eq!(
            network.move_node(NodeId(9)),
            Err(EngineError::UnknownNode(NodeId(9)))
        );
    }

    #[test]
    fn test_move_changes_only_assigned_variables() {
        let mut network = path(5, 11);
        while let Some(record) = network.run().next() {
            let record = record.unwrap();
            let changed: Vec<String> = record.changes().iter().map(|c| c.path_string()).collect();
            assert_eq!(changed, vec!["x"]);
            assert_eq!(record.rule, "raise");
            assert_eq!(record.prestate["id"], Value::Id(record.node));
        }
        assert!(network.is_stabilised());
    }

    #[test]
    fn test_run_yields_numbered_moves_until_stable() {
        let mut network = path(6, 5);
        let records: Vec<MoveRecord> = network.run().collect::<Result<_, _>>().unwrap();

        assert!(network.is_stabilised());
        assert_eq!(network.steps(), records.len() as u64);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.step, i as u64 + 1);
        }

        // Every node ends at the global maximum
        let values: Vec<i64> = network.nodes().filter_map(|n| n.get("x")?.as_int()).collect();
        assert!(values.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_read_only_stabilisation_check() {
        let mut network = path(5, 6);
        let mut check_rng = SmallRng::seed_from_u64(1);
        let shared: &Network = &network;
        assert!(!shared.is_stabilised_with(&mut check_rng));
        assert!(!shared.active_nodes_with(&mut check_rng).is_empty());

        network.run_until_stable(1_000).unwrap();
        let shared: &Network = &network;
        assert!(shared.is_stabilised_with(&mut check_rng));
        assert!(shared.active_nodes_with(&mut check_rng).is_empty());
    }

    #[test]
    fn test_read_only_check_leaves_run_unchanged() {
        let mut checked = path(6, 12);
        let mut plain = path(6, 12);
        let mut own_rng = SmallRng::seed_from_u64(77);
        for _ in 0..3 {
            checked.active_nodes_with(&mut own_rng);
        }

        let a: Vec<MoveRecord> = checked.run().collect::<Result<_, _>>().unwrap();
        let b: Vec<MoveRecord> = plain.run().collect::<Result<_, _>>().unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_run_on_stabilised_network_is_empty() {
        let mut network = path(3, 4);
        network.run_until_stable(1_000).unwrap();
        assert!(network.run().next().is_none());
    }

    #[test]
    fn test_move_bound() {
        let program = Arc::new(
            Program::builder("flip")
                .scalar("b", RandomValue::Bool)
                .rule("flip", |node, _rng| {
                    let b = node.bool("b")?;
                    Some(Assignment::new().set("b", !b))
                })
                .build()
                .unwrap(),
        );
        let mut network = Network::new(0);
        let node = Node::new(program, NodeId(1), network.rng_mut());
        network.insert(node).unwrap();

        assert_eq!(
            network.run_until_stable(25),
            Err(EngineError::MoveBoundExceeded(25))
        );
        assert_eq!(network.steps(), 25);
        assert_eq!(network.run().take(10).count(), 10);
    }

    #[test]
    fn test_undeclared_assignment_surfaces_error() {
        let program = Arc::new(
            Program::builder("broken")
                .rule("write_ghost", |_, _| Some(Assignment::new().set("ghost", 1i64)))
                .build()
                .unwrap(),
        );
        let mut network = Network::new(0);
        let node = Node::new(program, NodeId(1), network.rng_mut());
        network.insert(node).unwrap();

        let mut moves = network.run();
        assert!(matches!(
            moves.next(),
            Some(Err(EngineError::UndeclaredVariable { .. }))
        ));
        assert!(moves.next().is_none());
    }
}
