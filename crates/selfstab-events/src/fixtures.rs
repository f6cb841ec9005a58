//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers from other
//! crates.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // selfstab-events = { path = "../selfstab-events", features = ["test-fixtures"] }
//!
//! use selfstab_events::fixtures;
//!
//! let moves = fixtures::sample_moves();
//! ```

use crate::MoveRecord;

/// Returns sample move records from the fixtures file.
///
/// Contains 4 moves:
/// - 2 centroid weight repairs (`rule_1`) on leaf nodes
/// - 1 centroid pointer update (`rule_3`)
/// - 1 reset move touching three variables
pub fn sample_moves() -> Vec<MoveRecord> {
    let jsonl = include_str!("../tests/fixtures/sample_moves.jsonl");
    jsonl
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            MoveRecord::from_jsonl(l).unwrap_or_else(|e| {
                panic!("Failed to parse move line: {}\nError: {}", l, e)
            })
        })
        .collect()
}

/// Returns the sample moves made by the given rule.
pub fn moves_by_rule(rule: &str) -> Vec<MoveRecord> {
    sample_moves()
        .into_iter()
        .filter(|m| m.rule == rule)
        .collect()
}
