//! Move Records
//!
//! One record per daemon step: which node moved, which rule fired, and the
//! node's state immediately before and after.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diff::{diff, flatten, Change, StateDiff};
use crate::{NodeId, StateSnapshot};

/// Audit record of a single move.
///
/// Produced by the network once per move and handed to the caller; the
/// engine never keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 1-based sequence number of the move within its network
    pub step: u64,
    /// Name of the rule that fired
    pub rule: String,
    /// Node that made the move
    pub node: NodeId,
    pub prestate: StateSnapshot,
    pub poststate: StateSnapshot,
}

impl MoveRecord {
    pub fn new(
        step: u64,
        rule: impl Into<String>,
        node: NodeId,
        prestate: StateSnapshot,
        poststate: StateSnapshot,
    ) -> Self {
        Self {
            step,
            rule: rule.into(),
            node,
            prestate,
            poststate,
        }
    }

    /// Nested diff between pre- and post-state.
    pub fn diff(&self) -> StateDiff {
        diff(&self.prestate, &self.poststate)
    }

    /// Flattened changes, the canonical form for logs.
    pub fn changes(&self) -> Vec<Change> {
        flatten(&self.diff())
    }

    /// Serializes the record to a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a record from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[move {:>5}] node {} {}", self.step, self.node, self.rule)?;
        let changes = self.changes();
        if !changes.is_empty() {
            let joined = changes
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " ({})", joined)?;
        }
        Ok(())
    }
}
