//! Self-Stabilization Simulator Library
//!
//! Simulates self-stabilizing distributed algorithms under a central
//! daemon: nodes hold variables and guarded rules, and every move lets one
//! enabled node fire one enabled rule.

pub mod algorithms;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod random;
pub mod setup;
pub mod systems;

pub use algorithms::Algorithm;
pub use components::{Assignment, Node, NodeView, Program, ProgramBuilder, Rule};
pub use config::{ConfigError, SimConfig};
pub use error::{DefinitionError, EngineError, TopologyError};
pub use events::MoveLogger;
pub use output::{RunStats, StatsCollector};
pub use random::RandomValue;
pub use systems::{Moves, Network, NetworkId};

pub use selfstab_events::{MoveRecord, NodeId, StateSnapshot, Value};
