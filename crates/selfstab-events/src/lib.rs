//! Shared state and move-record types for the self-stabilization simulator.
//!
//! This crate contains pure data structures with no simulation logic.
//! The engine produces them; loggers and inspection tools consume them.

pub mod diff;
pub mod id;
pub mod record;
pub mod value;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export identifier types
pub use id::NodeId;

// Re-export value types
pub use value::{StateSnapshot, Value};

// Re-export diff types
pub use diff::{diff, flatten, Change, DiffNode, PathKey, StateDiff};

// Re-export record types
pub use record::MoveRecord;
