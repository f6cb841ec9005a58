//! Network systems: the node arena, its connectivity, and the central
//! daemon that schedules moves.

pub mod daemon;
pub mod network;

pub use daemon::Moves;
pub use network::{Network, NetworkId};
