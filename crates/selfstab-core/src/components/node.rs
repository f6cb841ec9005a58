//! Node Component
//!
//! A node holds its identity, neighbour set and variable store, and shares
//! its program with every other node of the same kind. Neighbours are
//! plain ids; the network arena owns all nodes.

use rand::rngs::SmallRng;
use rand::Rng;
use selfstab_events::{NodeId, StateSnapshot, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::program::{Assignment, Initializer, Program};
use crate::error::EngineError;
use crate::systems::NetworkId;

/// A computing node running a guarded-command program.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    neighbours: BTreeSet<NodeId>,
    variables: BTreeMap<String, Value>,
    program: Arc<Program>,
    network: Option<NetworkId>,
}

impl Node {
    /// Builds a node, drawing every scalar variable from its initializer.
    ///
    /// Table variables start empty; their entries are drawn as edges are
    /// added.
    pub fn new(program: Arc<Program>, id: NodeId, rng: &mut SmallRng) -> Self {
        let variables = program
            .variables()
            .iter()
            .map(|decl| {
                let value = match &decl.init {
                    Initializer::Scalar(generator) => generator.generate(rng),
                    Initializer::Table(_) => Value::Table(BTreeMap::new()),
                };
                (decl.name.clone(), value)
            })
            .collect();

        Self {
            id,
            neighbours: BTreeSet::new(),
            variables,
            program,
            network: None,
        }
    }

    /// Builds a node with an id drawn from the generator.
    pub fn with_random_id(program: Arc<Program>, rng: &mut SmallRng) -> Self {
        let id = NodeId(rng.gen());
        Self::new(program, id, rng)
    }

    /// Replaces an initial value before the node is registered.
    pub fn with_value(
        mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Self, EngineError> {
        self.set(name, value.into())?;
        Ok(self)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn neighbours(&self) -> &BTreeSet<NodeId> {
        &self.neighbours
    }

    pub fn is_neighbour(&self, other: NodeId) -> bool {
        self.neighbours.contains(&other)
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// The network that owns this node, once registered.
    pub fn network(&self) -> Option<NetworkId> {
        self.network
    }

    /// Reads a declared variable. `id` is not stored here; use [`Node::id`].
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Snapshot of exactly the declared variables plus `id`.
    pub fn state(&self) -> StateSnapshot {
        let mut state: StateSnapshot = self.variables.clone();
        state.insert("id".to_string(), Value::Id(self.id));
        state
    }

    pub(crate) fn set_network(&mut self, network: NetworkId) {
        self.network = Some(network);
    }

    pub(crate) fn add_neighbour(&mut self, other: NodeId) {
        self.neighbours.insert(other);
    }

    /// Draws missing table entries for a new neighbour.
    pub(crate) fn seed_tables(&mut self, neighbour: NodeId, rng: &mut SmallRng) {
        let program = Arc::clone(&self.program);
        for decl in program.table_variables() {
            let Initializer::Table(generator) = &decl.init else {
                continue;
            };
            if let Some(Value::Table(table)) = self.variables.get_mut(&decl.name) {
                table
                    .entry(neighbour)
                    .or_insert_with(|| generator.generate(rng));
            }
        }
    }

    pub(crate) fn set(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        match self.variables.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EngineError::UndeclaredVariable {
                node: self.id,
                variable: name.to_string(),
            }),
        }
    }

    /// Overwrites the assigned variables in place.
    ///
    /// Every name is checked before anything is written, so a bad
    /// assignment leaves the node untouched.
    pub(crate) fn apply(&mut self, assignment: &Assignment) -> Result<(), EngineError> {
        if let Some(name) = assignment.names().find(|n| !self.variables.contains_key(*n)) {
            return Err(EngineError::UndeclaredVariable {
                node: self.id,
                variable: name.to_string(),
            });
        }
        for (name, value) in assignment.iter() {
            self.set(name, value.clone())?;
        }
        Ok(())
    }
}
