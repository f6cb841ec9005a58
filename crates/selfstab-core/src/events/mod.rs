//! Move audit logging.

pub mod logger;

pub use logger::MoveLogger;
