//! Programs and Rules
//!
//! A program is the local guarded-command algorithm every node of one kind
//! runs: its declared variables with their initializers, and its named rules.

use rand::rngs::SmallRng;
use selfstab_events::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::view::NodeView;
use crate::error::DefinitionError;
use crate::random::RandomValue;

/// Variable assignment proposed by an enabled rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment(BTreeMap<String, Value>);

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable to overwrite.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Guard and assignment in one evaluation: `Some` when enabled.
///
/// Evaluations read the node and its neighbours' live state and may draw
/// from the generator, but never mutate anything.
pub type RuleFn = dyn Fn(&NodeView<'_>, &mut SmallRng) -> Option<Assignment> + Send + Sync;

/// A named guarded command.
pub struct Rule {
    name: &'static str,
    eval: Box<RuleFn>,
}

impl Rule {
    pub fn new(
        name: &'static str,
        eval: impl Fn(&NodeView<'_>, &mut SmallRng) -> Option<Assignment> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            eval: Box::new(eval),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Evaluates the rule against the current state.
    pub fn evaluate(&self, node: &NodeView<'_>, rng: &mut SmallRng) -> Option<Assignment> {
        (self.eval)(node, rng)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// How a declared variable gets its initial value.
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    /// Drawn once when the node is built
    Scalar(RandomValue),
    /// Per-neighbour table; an entry is drawn whenever an edge is added
    Table(RandomValue),
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub init: Initializer,
}

impl VariableDecl {
    pub fn is_table(&self) -> bool {
        matches!(self.init, Initializer::Table(_))
    }
}

/// A validated node program. Shared by every node that runs it.
#[derive(Debug)]
pub struct Program {
    name: String,
    variables: Vec<VariableDecl>,
    rules: Vec<Rule>,
}

impl Program {
    /// Starts declaring a program.
    pub fn builder(name: impl Into<String>) -> ProgramBuilder {
        ProgramBuilder {
            name: name.into(),
            variables: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[VariableDecl] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDecl> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn table_variables(&self) -> impl Iterator<Item = &VariableDecl> {
        self.variables.iter().filter(|v| v.is_table())
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }
}

/// Builder for declaring programs with a fluent API.
///
/// # Example
///
/// ```
/// use selfstab_core::{Assignment, Program, RandomValue};
///
/// let program = Program::builder("flag")
///     .scalar("up", RandomValue::Bool)
///     .rule("raise", |node, _rng| {
///         (node.bool("up") != Some(true)).then(|| Assignment::new().set("up", true))
///     })
///     .build()
///     .unwrap();
/// assert_eq!(program.rule_names(), vec!["raise"]);
/// ```
#[derive(Debug)]
pub struct ProgramBuilder {
    name: String,
    variables: Vec<VariableDecl>,
    rules: Vec<Rule>,
}

impl ProgramBuilder {
    /// Declares a scalar variable drawn once per node.
    pub fn scalar(mut self, name: impl Into<String>, init: RandomValue) -> Self {
        self.variables.push(VariableDecl {
            name: name.into(),
            init: Initializer::Scalar(init),
        });
        self
    }

    /// Declares a per-neighbour table variable.
    pub fn table(mut self, name: impl Into<String>, entry: RandomValue) -> Self {
        self.variables.push(VariableDecl {
            name: name.into(),
            init: Initializer::Table(entry),
        });
        self
    }

    pub fn rule(
        mut self,
        name: &'static str,
        eval: impl Fn(&NodeView<'_>, &mut SmallRng) -> Option<Assignment> + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Rule::new(name, eval));
        self
    }

    /// Validates the declaration.
    pub fn build(self) -> Result<Program, DefinitionError> {
        if self.rules.is_empty() {
            return Err(DefinitionError::NoRules { program: self.name });
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name) {
                return Err(DefinitionError::DuplicateRule {
                    program: self.name,
                    rule: rule.name.to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for var in &self.variables {
            if var.name == "id" {
                return Err(DefinitionError::ReservedVariable { program: self.name });
            }
            if !seen.insert(var.name.as_str()) {
                return Err(DefinitionError::DuplicateVariable {
                    program: self.name.clone(),
                    variable: var.name.clone(),
                });
            }
        }

        Ok(Program {
            name: self.name,
            variables: self.variables,
            rules: self.rules,
        })
    }
}
