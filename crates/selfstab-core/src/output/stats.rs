//! Statistics Output
//!
//! Collects per-run statistics from move records for the end-of-run
//! summary.

use selfstab_events::{MoveRecord, NodeId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Overall run statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub algorithm: String,
    pub seed: u64,
    pub node_count: usize,
    pub total_moves: u64,
    pub stabilised: bool,
    pub moves_by_rule: BTreeMap<String, u64>,
    pub moves_by_node: BTreeMap<NodeId, u64>,
    /// Leaf changes per top-level variable
    pub changes_by_variable: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<NodeId>,
}

impl RunStats {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Accumulates statistics as moves are made
#[derive(Debug, Default)]
pub struct StatsCollector {
    pub total_moves: u64,
    pub moves_by_rule: BTreeMap<String, u64>,
    pub moves_by_node: BTreeMap<NodeId, u64>,
    pub changes_by_variable: BTreeMap<String, u64>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one move
    pub fn record(&mut self, record: &MoveRecord) {
        self.total_moves += 1;
        *self.moves_by_rule.entry(record.rule.clone()).or_insert(0) += 1;
        *self.moves_by_node.entry(record.node).or_insert(0) += 1;

        for change in record.changes() {
            if let Some(variable) = change.variable() {
                *self
                    .changes_by_variable
                    .entry(variable.to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    /// Finish collection and produce the summary
    pub fn finish(
        self,
        algorithm: impl Into<String>,
        seed: u64,
        node_count: usize,
        stabilised: bool,
        centroid: Option<NodeId>,
    ) -> RunStats {
        RunStats {
            algorithm: algorithm.into(),
            seed,
            node_count,
            total_moves: self.total_moves,
            stabilised,
            moves_by_rule: self.moves_by_rule,
            moves_by_node: self.moves_by_node,
            changes_by_variable: self.changes_by_variable,
            centroid,
        }
    }
}
