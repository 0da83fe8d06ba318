//! # Orchestration Types
//!
//! Per-agent outcomes, workflow aggregates and the supervisor result handed
//! back to callers. `to_json` renders the map shape consumed by the request
//! handler: one entry per recorded agent plus `_workflow_metadata`.

use crate::constants::{metadata_keys, status};
use crate::models::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Outcome recorded for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome {
    /// Agent ran and returned a payload
    Completed {
        output: Value,
        execution_time_ms: u64,
    },
    /// Agent returned an error or a `"status": "failed"` payload
    Failed { error: String },
    /// Prerequisites were not met when the agent's turn came
    Skipped {
        error: String,
        missing_deps: Vec<String>,
    },
}

impl AgentOutcome {
    pub fn skipped(missing_deps: Vec<String>) -> Self {
        Self::Skipped {
            error: format!("Dependencies not met: {}", missing_deps.join(", ")),
            missing_deps,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed { .. } => status::COMPLETED,
            Self::Failed { .. } => status::FAILED,
            Self::Skipped { .. } => status::SKIPPED,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Per-agent entry of the result map
    ///
    /// Successful agents contribute their payload unchanged.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Completed { output, .. } => output.clone(),
            Self::Failed { error } => json!({
                "error": error,
                "status": status::FAILED,
            }),
            Self::Skipped {
                error,
                missing_deps,
            } => json!({
                "error": error,
                "status": status::SKIPPED,
                "missing_deps": missing_deps,
            }),
        }
    }
}

/// Aggregate view over one workflow pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub completed_agents: BTreeSet<String>,
    pub failed_agents: BTreeSet<String>,
    pub skipped_agents: BTreeSet<String>,
    /// Agents never reached because a critical agent stopped the pass
    pub aborted_agents: Vec<String>,
    /// Critical agent that stopped the pass
    pub aborted_by: Option<String>,
    /// Length of the execution order
    pub total_agents: usize,
    pub success_rate: f64,
}

impl WorkflowMetadata {
    pub fn new(total_agents: usize) -> Self {
        Self {
            total_agents,
            ..Self::default()
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted_by.is_some()
    }

    /// `completed / total`, zero for an empty order
    pub fn compute_success_rate(&mut self) {
        self.success_rate = if self.total_agents == 0 {
            0.0
        } else {
            self.completed_agents.len() as f64 / self.total_agents as f64
        };
    }
}

/// Result of one workflow pass, in execution order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub results: Vec<(String, AgentOutcome)>,
    pub workflow_metadata: WorkflowMetadata,
}

impl WorkflowResult {
    pub fn get(&self, agent_name: &str) -> Option<&AgentOutcome> {
        self.results
            .iter()
            .find(|(name, _)| name == agent_name)
            .map(|(_, outcome)| outcome)
    }

    /// Agents that have a recorded outcome, in execution order
    pub fn recorded_agents(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|(name, _)| name.as_str())
    }

    pub fn to_json(&self) -> Value {
        let mut map = Metadata::new();
        for (name, outcome) in &self.results {
            map.insert(name.clone(), outcome.to_json());
        }
        map.insert(
            metadata_keys::WORKFLOW_METADATA.to_string(),
            serde_json::to_value(&self.workflow_metadata).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }
}

/// Everything the supervisor hands back for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorResult {
    pub run_id: String,
    pub user_id: String,
    pub thread_id: String,
    pub workflow: WorkflowResult,
    /// No agent failed and no critical agent stopped the pass
    pub orchestration_successful: bool,
    pub execution_time_ms: u64,
    /// Parent context metadata after all merge-backs
    pub metadata: Metadata,
}

impl SupervisorResult {
    pub fn to_json(&self) -> Value {
        json!({
            "run_id": self.run_id,
            "user_id": self.user_id,
            "thread_id": self.thread_id,
            "results": self.workflow.to_json(),
            "orchestration_successful": self.orchestration_successful,
            "execution_time_ms": self.execution_time_ms,
            "metadata": Value::Object(self.metadata.clone()),
        })
    }
}
