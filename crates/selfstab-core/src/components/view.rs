//! Node Views
//!
//! Read-only access to a node and the live state of its neighbours, used
//! for rule evaluation and by inspection code.

use rand::rngs::SmallRng;
use rand::seq::IteratorRandom;
use selfstab_events::{NodeId, StateSnapshot, Value};
use std::collections::BTreeMap;

use super::node::Node;

/// A node seen together with the arena it lives in.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    node: &'a Node,
    arena: &'a BTreeMap<NodeId, Node>,
}

impl<'a> NodeView<'a> {
    pub(crate) fn new(node: &'a Node, arena: &'a BTreeMap<NodeId, Node>) -> Self {
        Self { node, arena }
    }

    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.node.get(name)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn id_var(&self, name: &str) -> Option<NodeId> {
        self.get(name).and_then(Value::as_id)
    }

    pub fn table(&self, name: &str) -> Option<&'a BTreeMap<NodeId, Value>> {
        self.get(name).and_then(Value::as_table)
    }

    /// Reads one entry of a table variable as a float.
    pub fn table_float(&self, name: &str, key: NodeId) -> Option<f64> {
        self.table(name)
            .and_then(|table| table.get(&key))
            .and_then(Value::as_float)
    }

    pub fn state(&self) -> StateSnapshot {
        self.node.state()
    }

    /// Neighbours in ascending id order, with their current state.
    pub fn neighbours(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let arena = self.arena;
        self.node
            .neighbours()
            .iter()
            .filter_map(move |id| arena.get(id))
            .map(move |node| NodeView::new(node, arena))
    }

    pub fn neighbour_count(&self) -> usize {
        self.node.neighbours().len()
    }

    /// One neighbour drawn uniformly, or `None` for an isolated node.
    pub fn random_neighbour(&self, rng: &mut SmallRng) -> Option<NodeView<'a>> {
        self.neighbours().choose(rng)
    }

    /// Names of the rules currently enabled, in declaration order.
    ///
    /// Callers must not rely on the order.
    pub fn active_rule_names(&self, rng: &mut SmallRng) -> Vec<&'static str> {
        self.node
            .program()
            .rules()
            .iter()
            .filter(|rule| rule.evaluate(self, rng).is_some())
            .map(|rule| rule.name())
            .collect()
    }

    /// True if at least one rule is enabled.
    pub fn is_active(&self, rng: &mut SmallRng) -> bool {
        self.node
            .program()
            .rules()
            .iter()
            .any(|rule| rule.evaluate(self, rng).is_some())
    }
}
