//! Network
//!
//! Authoritative arena of nodes indexed by id. Neighbour relations are id
//! sets inside each node, so the graph has a single owner and no cycles of
//! references.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use selfstab_events::{NodeId, StateSnapshot, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::components::{Node, NodeView};
use crate::error::{EngineError, TopologyError};

static NEXT_NETWORK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a network, stamped on every node it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkId(u64);

impl NetworkId {
    fn next() -> Self {
        NetworkId(NEXT_NETWORK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net_{:04}", self.0)
    }
}

/// A simulated distributed system: its nodes, their connectivity, and the
/// random source that drives the daemon.
#[derive(Debug)]
pub struct Network {
    pub(crate) id: NetworkId,
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) rng: SmallRng,
    pub(crate) steps: u64,
}

impl Network {
    /// Creates an empty network whose random draws follow `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: SmallRng) -> Self {
        Self {
            id: NetworkId::next(),
            nodes: BTreeMap::new(),
            rng,
            steps: 0,
        }
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    /// The network's generator, for building nodes from the same seed.
    pub fn rng_mut(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Registers a node. Fails if the id is taken or the node is already
    /// owned by another network.
    pub fn insert(&mut self, mut node: Node) -> Result<NodeId, TopologyError> {
        let id = node.id();
        match node.network() {
            Some(owner) if owner != self.id => return Err(TopologyError::ForeignNetwork(id)),
            _ => {}
        }
        if self.nodes.contains_key(&id) {
            return Err(TopologyError::DuplicateNode(id));
        }
        node.set_network(self.id);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Registers an unowned node and connects it to a node already here.
    ///
    /// Nothing is registered if the connection would be invalid.
    pub fn attach(&mut self, existing: NodeId, node: Node) -> Result<NodeId, TopologyError> {
        if !self.nodes.contains_key(&existing) {
            return Err(TopologyError::UnknownNode(existing));
        }
        if node.id() == existing {
            return Err(TopologyError::SelfLoop(existing));
        }
        let id = self.insert(node)?;
        self.connect(existing, id)?;
        Ok(id)
    }

    /// Adds the symmetric edge `a`–`b`. Connecting twice is a no-op apart
    /// from seeding any missing table entries.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<(), TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLoop(a));
        }
        for id in [a, b] {
            if !self.nodes.contains_key(&id) {
                return Err(TopologyError::UnknownNode(id));
            }
        }

        let Network { nodes, rng, .. } = self;
        for (this, other) in [(a, b), (b, a)] {
            if let Some(node) = nodes.get_mut(&this) {
                node.add_neighbour(other);
                node.seed_tables(other, rng);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn view(&self, id: NodeId) -> Option<NodeView<'_>> {
        self.nodes.get(&id).map(|node| NodeView::new(node, &self.nodes))
    }

    pub fn neighbours(&self, id: NodeId) -> Result<Vec<NodeId>, EngineError> {
        self.node(id)
            .map(|node| node.neighbours().iter().copied().collect())
            .ok_or(EngineError::UnknownNode(id))
    }

    pub fn state(&self, id: NodeId) -> Result<StateSnapshot, EngineError> {
        self.node(id)
            .map(Node::state)
            .ok_or(EngineError::UnknownNode(id))
    }

    /// Snapshot of every node, keyed by id.
    pub fn states(&self) -> BTreeMap<NodeId, StateSnapshot> {
        self.nodes.iter().map(|(id, node)| (*id, node.state())).collect()
    }

    /// Number of moves made so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// True if every edge is listed on both of its endpoints.
    pub fn is_symmetric(&self) -> bool {
        self.nodes.values().all(|node| {
            node.neighbours().iter().all(|other| {
                self.nodes
                    .get(other)
                    .is_some_and(|n| n.is_neighbour(node.id()))
            })
        })
    }

    /// Overwrites a variable from outside the daemon, as a transient fault.
    ///
    /// Used to perturb a stabilised network and watch it recover.
    pub fn set_variable(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), EngineError> {
        self.nodes
            .get_mut(&id)
            .ok_or(EngineError::UnknownNode(id))?
            .set(name, value.into())
    }
}
