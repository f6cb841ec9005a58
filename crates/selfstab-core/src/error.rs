//! Error Types
//!
//! Every failure in the engine surfaces synchronously to the caller of the
//! triggering operation. Nothing is retried or swallowed.

use selfstab_events::NodeId;
use thiserror::Error;

/// A program declaration is invalid. Raised when the program is built,
/// before any node runs it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("program '{program}' declares no rules")]
    NoRules { program: String },
    #[error("program '{program}' declares rule '{rule}' twice")]
    DuplicateRule { program: String, rule: String },
    #[error("program '{program}' declares variable '{variable}' twice")]
    DuplicateVariable { program: String, variable: String },
    #[error("program '{program}' may not declare the reserved variable 'id'")]
    ReservedVariable { program: String },
}

/// The connectivity or ownership invariant would be broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("node {0} cannot be connected to itself")]
    SelfLoop(NodeId),
    #[error("node {0} is already registered in this network")]
    DuplicateNode(NodeId),
    #[error("node {0} belongs to a different network")]
    ForeignNetwork(NodeId),
    #[error("node {0} is not registered in this network")]
    UnknownNode(NodeId),
}

/// Errors raised while running the daemon or mutating node state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no active node: the network is stabilised")]
    NoActiveNode,
    #[error("node {0} has no active rule")]
    NoActiveRule(NodeId),
    #[error("rule '{rule}' of node {node} was no longer enabled when re-evaluated")]
    RuleWithdrawn { node: NodeId, rule: &'static str },
    #[error("node {node} has no variable named '{variable}'")]
    UndeclaredVariable { node: NodeId, variable: String },
    #[error("node {0} is not registered in this network")]
    UnknownNode(NodeId),
    #[error("network did not stabilise within {0} moves")]
    MoveBoundExceeded(u64),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
