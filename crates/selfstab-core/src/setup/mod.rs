//! Network setup: topology builders and the fixed test fixture.

pub mod topology;

pub use topology::{
    build_tree, centroid_fixture, random_edges, random_tree, random_weighted_tree, FIXTURE_EDGES,
    FIXTURE_WEIGHTS,
};
