//! # Dependency Resolver
//!
//! Answers one question for the workflow executor: given the agents that have
//! completed so far, may this agent run?
//!
//! The prerequisite table is validated once, when the resolver is built. A
//! cycle would leave every agent on it permanently unsatisfiable, so it is
//! rejected as a [`SupervisorError::CyclicDependency`] carrying the cycle path
//! instead of surfacing later as silent skips.

use crate::constants::DEFAULT_AGENT_DEPENDENCIES;
use crate::error::{Result, SupervisorError};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Prerequisites per agent. Agents without an entry have none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTable {
    // BTreeMap keeps cycle reports deterministic
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for DependencyTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_AGENT_DEPENDENCIES
                .iter()
                .map(|(agent, deps)| {
                    (
                        agent.to_string(),
                        deps.iter().map(|d| d.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl DependencyTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn from_map(entries: HashMap<String, Vec<String>>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn with_dependency(
        mut self,
        agent: impl Into<String>,
        prerequisites: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.entries.insert(
            agent.into(),
            prerequisites.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Declared prerequisites, in declaration order
    pub fn dependencies_of(&self, agent: &str) -> &[String] {
        self.entries.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Agents that declare at least one entry
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Depth-first search for a back edge; returns the first cycle found
    pub fn validate_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            table: &'a DependencyTable,
            agent: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            match marks.get(agent) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|a| *a == agent).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|a| a.to_string()).collect();
                    cycle.push(agent.to_string());
                    return Some(cycle);
                }
                None => {}
            }

            marks.insert(agent, Mark::Visiting);
            path.push(agent);
            for dependency in table.dependencies_of(agent) {
                if let Some(cycle) = visit(table, dependency, marks, path) {
                    return Some(cycle);
                }
            }
            path.pop();
            marks.insert(agent, Mark::Done);
            None
        }

        let mut marks = HashMap::new();
        let mut path = Vec::new();
        for agent in self.agents() {
            if let Some(cycle) = visit(self, agent, &mut marks, &mut path) {
                return Err(SupervisorError::CyclicDependency { cycle });
            }
        }
        Ok(())
    }
}

/// Prerequisite checks against a validated [`DependencyTable`]
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    table: DependencyTable,
}

impl DependencyResolver {
    pub fn new(table: DependencyTable) -> Result<Self> {
        table.validate_acyclic()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &DependencyTable {
        &self.table
    }

    /// True when every declared prerequisite of `agent` has completed
    pub fn can_execute(&self, agent: &str, completed: &HashSet<String>) -> bool {
        self.table
            .dependencies_of(agent)
            .iter()
            .all(|dependency| completed.contains(dependency))
    }

    /// Unsatisfied prerequisites, in declaration order
    pub fn missing_dependencies(&self, agent: &str, completed: &HashSet<String>) -> Vec<String> {
        self.table
            .dependencies_of(agent)
            .iter()
            .filter(|dependency| !completed.contains(*dependency))
            .cloned()
            .collect()
    }
}
