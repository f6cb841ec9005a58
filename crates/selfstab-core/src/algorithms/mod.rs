//! Algorithm programs runnable on the network.

pub mod centroid;
pub mod reset;

use std::fmt;
use std::str::FromStr;

/// Programs the driver knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Centroid,
    Reset,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Centroid => write!(f, "{}", centroid::PROGRAM_NAME),
            Algorithm::Reset => write!(f, "{}", reset::PROGRAM_NAME),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "centroid" => Ok(Algorithm::Centroid),
            "reset" => Ok(Algorithm::Reset),
            _ => Err(format!("unknown algorithm: '{}'", s)),
        }
    }
}
