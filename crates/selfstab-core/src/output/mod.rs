//! Run output: statistics collected over a run.

pub mod stats;

pub use stats::{RunStats, StatsCollector};
