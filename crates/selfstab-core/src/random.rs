//! Random Value Generators
//!
//! Parameterized factories for initial variable values. Self-stabilization
//! has to hold from any starting configuration, so nodes start from values
//! drawn here rather than from a legitimate state.

use rand::rngs::SmallRng;
use rand::Rng;
use selfstab_events::{NodeId, Value};

/// Default inclusive upper bound for random integers.
pub const MAX_RAND_INT: i64 = 1 << 31;

/// Generator for one variable's initial value.
#[derive(Debug, Clone, PartialEq)]
pub enum RandomValue {
    /// Uniform integer in `0..=upper_bound`
    Int { upper_bound: i64 },
    /// Fair coin
    Bool,
    /// Uniform float in `[0, scale)`
    Float { scale: f64 },
    /// Node id with raw value uniform in `0..=upper_bound`
    Id { upper_bound: u64 },
    /// Always the same value
    Const(Value),
}

impl RandomValue {
    /// Integer generator with the default bound.
    pub fn int() -> Self {
        RandomValue::Int {
            upper_bound: MAX_RAND_INT,
        }
    }

    pub fn int_up_to(upper_bound: i64) -> Self {
        RandomValue::Int { upper_bound }
    }

    pub fn float(scale: f64) -> Self {
        RandomValue::Float { scale }
    }

    pub fn id_up_to(upper_bound: u64) -> Self {
        RandomValue::Id { upper_bound }
    }

    /// Draws a fresh value.
    pub fn generate(&self, rng: &mut SmallRng) -> Value {
        match self {
            RandomValue::Int { upper_bound } => {
                Value::Int(rng.gen_range(0..=(*upper_bound).max(0)))
            }
            RandomValue::Bool => Value::Bool(rng.gen()),
            RandomValue::Float { scale } => Value::Float(rng.gen::<f64>() * scale),
            RandomValue::Id { upper_bound } => Value::Id(NodeId(rng.gen_range(0..=*upper_bound))),
            RandomValue::Const(value) => value.clone(),
        }
    }
}
