//! State Diffs
//!
//! Recursive comparison of two state snapshots, and flattening of the
//! result into (path, old, new) triples for logging and display.
//!
//! # Example
//!
//! ```
//! use selfstab_events::{diff, flatten, StateSnapshot, Value};
//!
//! let mut before = StateSnapshot::new();
//! before.insert("k".to_string(), Value::Int(7));
//! let mut after = before.clone();
//! after.insert("k".to_string(), Value::Int(1));
//!
//! let changes = flatten(&diff(&before, &after));
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].to_string(), "k: 7 -> 1");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{NodeId, StateSnapshot, Value};

/// One step of a path into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKey {
    /// Top-level variable name
    Var(String),
    /// Key inside a per-neighbour table
    Node(NodeId),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Var(name) => write!(f, "{}", name),
            PathKey::Node(id) => write!(f, "{}", id),
        }
    }
}

/// A changed entry in a diff.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffNode {
    /// Leaf change. `None` marks a key missing on that side.
    Leaf {
        old: Option<Value>,
        new: Option<Value>,
    },
    /// Both sides were tables; only the differing keys are kept.
    Nested(StateDiff),
}

/// Mapping of changed keys only.
pub type StateDiff = BTreeMap<PathKey, DiffNode>;

/// Compares two snapshots, keeping only the keys whose value changed.
///
/// Tables are compared key by key; scalars with `!=`.
pub fn diff(prestate: &StateSnapshot, poststate: &StateSnapshot) -> StateDiff {
    diff_maps(prestate, poststate, |name| PathKey::Var(name.clone()))
}

fn diff_maps<K: Ord>(
    pre: &BTreeMap<K, Value>,
    post: &BTreeMap<K, Value>,
    to_key: impl Fn(&K) -> PathKey,
) -> StateDiff {
    let mut result = StateDiff::new();

    for (key, old) in pre {
        match post.get(key) {
            Some(new) => {
                if let Some(node) = diff_values(old, new) {
                    result.insert(to_key(key), node);
                }
            }
            None => {
                result.insert(
                    to_key(key),
                    DiffNode::Leaf {
                        old: Some(old.clone()),
                        new: None,
                    },
                );
            }
        }
    }

    for (key, new) in post {
        if !pre.contains_key(key) {
            result.insert(
                to_key(key),
                DiffNode::Leaf {
                    old: None,
                    new: Some(new.clone()),
                },
            );
        }
    }

    result
}

fn diff_values(old: &Value, new: &Value) -> Option<DiffNode> {
    match (old, new) {
        (Value::Table(a), Value::Table(b)) => {
            let nested = diff_maps(a, b, |id| PathKey::Node(*id));
            if nested.is_empty() {
                None
            } else {
                Some(DiffNode::Nested(nested))
            }
        }
        _ if old != new => Some(DiffNode::Leaf {
            old: Some(old.clone()),
            new: Some(new.clone()),
        }),
        _ => None,
    }
}

/// A single leaf change with its full path from the snapshot root.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: Vec<PathKey>,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl Change {
    /// Returns the path joined with dots, e.g. `W.3`.
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(|key| key.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Returns the top-level variable this change belongs to.
    pub fn variable(&self) -> Option<&str> {
        match self.path.first() {
            Some(PathKey::Var(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: &Option<Value>| match value {
            Some(v) => v.to_string(),
            None => "<unset>".to_string(),
        };
        write!(
            f,
            "{}: {} -> {}",
            self.path_string(),
            show(&self.old),
            show(&self.new)
        )
    }
}

/// Walks a diff and yields every leaf with its path, in key order.
pub fn flatten(diff: &StateDiff) -> Vec<Change> {
    let mut changes = Vec::new();
    flatten_into(diff, &mut Vec::new(), &mut changes);
    changes
}

fn flatten_into(diff: &StateDiff, prefix: &mut Vec<PathKey>, out: &mut Vec<Change>) {
    for (key, node) in diff {
        prefix.push(key.clone());
        match node {
            DiffNode::Leaf { old, new } => out.push(Change {
                path: prefix.clone(),
                old: old.clone(),
                new: new.clone(),
            }),
            DiffNode::Nested(nested) => flatten_into(nested, prefix, out),
        }
        prefix.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, Value)]) -> StateSnapshot {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn table(entries: &[(u64, f64)]) -> Value {
        Value::Table(
            entries
                .iter()
                .map(|(k, v)| (NodeId(*k), Value::Float(*v)))
                .collect(),
        )
    }

    #[test]
    fn test_identical_snapshots_produce_empty_diff() {
        let state = snapshot(&[
            ("id", Value::Id(NodeId(1))),
            ("W", table(&[(2, 1.0), (3, 4.0)])),
            ("p", Value::Id(NodeId(2))),
        ]);
        assert!(diff(&state, &state).is_empty());
        assert!(flatten(&diff(&state, &state)).is_empty());
    }

    #[test]
    fn test_scalar_change() {
        let before = snapshot(&[("p", Value::Id(NodeId(2))), ("w", Value::Float(3.0))]);
        let after = snapshot(&[("p", Value::Id(NodeId(5))), ("w", Value::Float(3.0))]);

        let d = diff(&before, &after);
        assert_eq!(d.len(), 1);
        assert_eq!(
            d.get(&PathKey::Var("p".into())),
            Some(&DiffNode::Leaf {
                old: Some(Value::Id(NodeId(2))),
                new: Some(Value::Id(NodeId(5))),
            })
        );
    }

    #[test]
    fn test_nested_table_reports_only_changed_keys() {
        let before = snapshot(&[("W", table(&[(2, 1.0), (3, 4.0), (4, 0.5)]))]);
        let after = snapshot(&[("W", table(&[(2, 1.0), (3, 9.0), (4, 0.5)]))]);

        let changes = flatten(&diff(&before, &after));
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].path,
            vec![PathKey::Var("W".into()), PathKey::Node(NodeId(3))]
        );
        assert_eq!(changes[0].old, Some(Value::Float(4.0)));
        assert_eq!(changes[0].new, Some(Value::Float(9.0)));
        assert_eq!(changes[0].variable(), Some("W"));
        assert_eq!(changes[0].to_string(), "W.3: 4 -> 9");
    }

    #[test]
    fn test_flatten_covers_every_differing_leaf() {
        let before = snapshot(&[
            ("W", table(&[(2, 1.0), (3, 4.0)])),
            ("k", Value::Int(7)),
            ("yes", Value::Bool(true)),
        ]);
        let after = snapshot(&[
            ("W", table(&[(2, 2.0), (3, 5.0)])),
            ("k", Value::Int(1)),
            ("yes", Value::Bool(true)),
        ]);

        let paths: Vec<String> = flatten(&diff(&before, &after))
            .iter()
            .map(|c| c.path_string())
            .collect();
        assert_eq!(paths, vec!["W.2", "W.3", "k"]);
    }

    #[test]
    fn test_missing_keys_reported_as_unset() {
        let before = snapshot(&[("W", table(&[(2, 1.0)]))]);
        let after = snapshot(&[("W", table(&[(2, 1.0), (5, 3.0)]))]);

        let changes = flatten(&diff(&before, &after));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old, None);
        assert_eq!(changes[0].to_string(), "W.5: <unset> -> 3");
    }

    #[test]
    fn test_table_replaced_by_scalar_is_a_leaf() {
        let before = snapshot(&[("x", table(&[(2, 1.0)]))]);
        let after = snapshot(&[("x", Value::Int(0))]);

        let changes = flatten(&diff(&before, &after));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, vec![PathKey::Var("x".into())]);
    }
}
