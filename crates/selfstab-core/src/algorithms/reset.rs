//! Reset Program
//!
//! Minimal one-rule program: any node whose counter is not 1 resets it and
//! clears both flags. Every node stabilises after at most one move, which
//! makes it a convenient check of the daemon itself.

use selfstab_events::Value;

use crate::components::{Assignment, Program};
use crate::config::RandomConfig;
use crate::error::DefinitionError;
use crate::random::RandomValue;

pub const PROGRAM_NAME: &str = "reset";

pub fn program(config: &RandomConfig) -> Result<Program, DefinitionError> {
    Program::builder(PROGRAM_NAME)
        .scalar("k", RandomValue::int_up_to(config.int_upper_bound))
        .scalar("yes", RandomValue::Bool)
        .scalar("yess", RandomValue::Bool)
        .rule("reset", |node, _rng| {
            (node.get("k") != Some(&Value::Int(1))).then(|| {
                Assignment::new()
                    .set("k", 1i64)
                    .set("yes", false)
                    .set("yess", false)
            })
        })
        .build()
}
