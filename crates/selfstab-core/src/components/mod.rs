//! Node components: the node itself, its program, and read-only views.

pub mod node;
pub mod program;
pub mod view;

pub use node::Node;
pub use program::{Assignment, Initializer, Program, ProgramBuilder, Rule, RuleFn, VariableDecl};
pub use view::NodeView;
